use std::fmt;

use async_trait::async_trait;
use shared::domain::RecordId;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route(String);

impl Route {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Fills every `{id}` placeholder in a route template.
    pub fn from_template(template: &str, id: &RecordId) -> Self {
        Self(template.replace("{id}", id.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
pub trait Navigator: Send + Sync {
    async fn navigate(&self, route: Route);
}

/// Keeps every route it was asked to open, in order.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn visited(&self) -> Vec<Route> {
        self.visited.lock().await.clone()
    }

    pub async fn last(&self) -> Option<Route> {
        self.visited.lock().await.last().cloned()
    }
}

#[async_trait]
impl Navigator for RecordingNavigator {
    async fn navigate(&self, route: Route) {
        tracing::debug!(%route, "navigate");
        self.visited.lock().await.push(route);
    }
}
