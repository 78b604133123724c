use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default, Clone, Serialize)]
pub struct MetricsData {
    pub response_types: HashMap<String, u64>,
    pub relay_failures: HashMap<String, u64>,
}

#[derive(Debug, Clone)]
pub struct MetricsManager {
    inner: Arc<RwLock<MetricsData>>,
}

impl Default for MetricsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsManager {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MetricsData::default())),
        }
    }

    pub async fn increment_response_type(&self, response_type: &str) {
        let mut data = self.inner.write().await;
        *data
            .response_types
            .entry(response_type.to_string())
            .or_insert(0) += 1;
    }

    pub async fn increment_failure(&self, kind: &str) {
        let mut data = self.inner.write().await;
        *data.relay_failures.entry(kind.to_string()).or_insert(0) += 1;
    }

    pub async fn get_metrics(&self) -> MetricsData {
        self.inner.read().await.clone()
    }
}
