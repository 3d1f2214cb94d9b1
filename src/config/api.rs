use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub stream_timeout: Option<u64>,
    #[serde(default)]
    pub context_limit: Option<usize>,
}
