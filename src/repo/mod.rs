// ============================================================================
// Repository Implementations
// ============================================================================
//
// Postgres is the system of record. The in-memory repository backs the
// workflow tests with the same contract.
//
// ============================================================================

mod memory;
mod postgres;

pub use memory::InMemoryCommentRepository;
pub use postgres::PgCommentRepository;
