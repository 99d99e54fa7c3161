// ============================================================================
// Workflows - orchestration over the domain, repository and broker
// ============================================================================
//
// One struct per operation, dependency-injected through Arc'd traits:
// - CreateCommentWorkflow: validate -> persist -> best-effort publish
// - StatusUpdateWorkflow: consume verdicts -> transition stored comments
// - ThreadViewWorkflow: load approved comments -> reconstruct the tree
//
// ============================================================================

pub mod create;
pub mod status;
pub mod thread_view;

pub use create::{CreateCommentWorkflow, CreateError, NewCommentRequest};
pub use status::StatusUpdateWorkflow;
pub use thread_view::{ThreadViewError, ThreadViewWorkflow};
