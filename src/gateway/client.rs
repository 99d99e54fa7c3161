use reqwest::Method;
use std::time::Duration;

// ============================================================================
// Proxy Client
// ============================================================================
//
// Thin wrapper over one shared reqwest client. Inbound headers (minus
// Host) and the request-correlation id travel with every upstream call;
// a shared timeout bounds both aggregated calls.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("service route not found: {0}")]
    RouteNotFound(String),

    #[error("failed to reach upstream service: {0}")]
    Unreachable(#[from] reqwest::Error),
}

/// The slice of an upstream response the gateway cares about.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Inbound request context forwarded to upstream services.
#[derive(Debug, Clone, Default)]
pub struct InboundContext {
    pub request_id: String,
    /// Header pairs minus `Host`; non-UTF-8 values are dropped.
    pub headers: Vec<(String, String)>,
}

pub struct ProxyClient {
    http: reqwest::Client,
}

impl ProxyClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    pub async fn forward(
        &self,
        method: Method,
        url: &str,
        ctx: &InboundContext,
        body: Option<Vec<u8>>,
    ) -> Result<UpstreamResponse, ProxyError> {
        let mut request = self.http.request(method, url);

        for (name, value) in &ctx.headers {
            if name.eq_ignore_ascii_case("host") {
                continue;
            }
            request = request.header(name.as_str(), value.as_str());
        }
        if !ctx.request_id.is_empty() {
            request = request.header("X-Request-ID", ctx.request_id.as_str());
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        tracing::debug!(url = %url, status = status, "Upstream call completed");

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}
