use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::resolver::{ResolverOptions, DEFAULT_USER_AGENT};
use crate::shortener::ShortenerRegistry;

/// Shortener resolution parameters (`[resolver]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Deadline in seconds for one resolution attempt (HEAD + GET + HTML).
    pub timeout_secs: u64,
    /// Connect timeout in seconds for each probe.
    pub connect_timeout_secs: u64,
    /// Maximum redirects followed per probe.
    pub max_redirects: u32,
    /// Maximum bytes of a page kept for meta-refresh / script inspection.
    pub max_body_bytes: usize,
    /// User-Agent sent with every probe.
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 15,
            max_redirects: 10,
            max_body_bytes: 512 * 1024,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ResolverConfig {
    pub fn to_options(&self) -> ResolverOptions {
        ResolverOptions {
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs.max(1)),
            max_redirects: self.max_redirects,
            max_body_bytes: self.max_body_bytes,
            user_agent: self.user_agent.clone(),
        }
    }
}

/// Global configuration loaded from `~/.config/linkpeel/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkpeelConfig {
    #[serde(default)]
    pub resolver: ResolverConfig,
    /// Additional shortener domains (e.g. an internal go-link host).
    #[serde(default)]
    pub extra_shorteners: Vec<String>,
}

impl LinkpeelConfig {
    /// Built-in shortener registry extended with `extra_shorteners`.
    pub fn shortener_registry(&self) -> ShortenerRegistry {
        ShortenerRegistry::builtin().with_extra(&self.extra_shorteners)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("linkpeel")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<LinkpeelConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = LinkpeelConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: LinkpeelConfig = toml::from_str(&data)?;
    Ok(cfg)
}
