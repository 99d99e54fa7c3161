// ============================================================================
// API Gateway - one public surface over the news and comments services
// ============================================================================
//
// The gateway fans a "article with comments" request out to the two
// upstream services concurrently and merges the results; everything else
// is a transparent proxy. No retries: a single upstream timeout is
// conclusive and surfaces through the failure path.
//
// ============================================================================

pub mod aggregator;
pub mod client;
pub mod handlers;
pub mod registry;

pub use aggregator::{Aggregator, GatewayResponse};
pub use client::{InboundContext, ProxyClient, ProxyError, UpstreamResponse};
pub use registry::{Route, RouteRegistry, COMMENTS_ROUTE, NEWS_ROUTE};
