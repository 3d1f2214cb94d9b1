use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Bearer token; `${VAR}` references are expanded from the environment.
    #[serde(default)]
    pub token: Option<String>,
}
