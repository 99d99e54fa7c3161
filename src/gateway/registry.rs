use serde::Deserialize;

// ============================================================================
// Route Registry
// ============================================================================
//
// Fixed per-route base URLs looked up by logical service name. Populated
// from configuration at startup and shared read-only afterwards.
//
// ============================================================================

pub const NEWS_ROUTE: &str = "news";
pub const COMMENTS_ROUTE: &str = "comments";

#[derive(Debug, Clone, Deserialize)]
pub struct Route {
    pub name: String,
    pub base_url: String,
    #[serde(default = "default_health_path")]
    pub health_path: String,
}

impl Route {
    /// Absolute URL of the upstream's health endpoint.
    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_url, self.health_path)
    }
}

fn default_health_path() -> String {
    "/health".to_string()
}

pub struct RouteRegistry {
    routes: Vec<Route>,
}

impl RouteRegistry {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    pub fn lookup(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.name == name)
    }

    pub fn all(&self) -> &[Route] {
        &self.routes
    }
}
