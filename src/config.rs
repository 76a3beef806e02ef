use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::frontend::SslPolicy;
use crate::watch;

/// Layered configuration: defaults, then `concierge.toml`,
/// `concierge.json` and `CONCIERGE_`-prefixed environment variables.
/// Command-line flags override whatever was loaded.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Url used to connect to the docker server.
    pub url: String,
    /// Frontend network name.
    pub network: String,
    /// Settle window in seconds for watch mode.
    pub timeout: u64,
    /// Container actions that mark the inventory dirty.
    pub events: Vec<String>,
    /// Value templates see as each frontend's `ssl` field.
    pub ssl_policy: SslPolicy,
    /// Fail renders on undefined template variables.
    pub strict_templates: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: "unix:///var/run/docker.sock".into(),
            network: "frontnet".into(),
            timeout: 5,
            events: watch::DEFAULT_ACTIONS.iter().map(|s| s.to_string()).collect(),
            ssl_policy: SslPolicy::default(),
            strict_templates: false,
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("concierge.toml"))
            .merge(Json::file("concierge.json"))
            .merge(Env::prefixed("CONCIERGE_"))
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
    }
}
