use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::annotation::{DEFAULT_JPEG_QUALITY, RenderContext};
use crate::error::ConfigurationError;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_FONT_PATH: &str = "fonts/DejaVuSansCondensed.ttf";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub font_path: PathBuf,
    pub poll_interval_seconds: u64,
    /// Upper bound on concurrently running analysis jobs; unbounded when unset
    pub max_concurrent_jobs: Option<usize>,
    pub jpeg_quality: u8,
    pub is_verbose: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            font_path: PathBuf::from(DEFAULT_FONT_PATH),
            poll_interval_seconds: 1,
            max_concurrent_jobs: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            is_verbose: false,
        }
    }
}

impl BotConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            ConfigurationError::ReadConfig {
                path: path.to_path_buf(),
                source,
            }
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigurationError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    /// An explicit path must exist; otherwise `config.json` in the working
    /// directory is used when present, and the defaults when not.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds.max(1))
    }

    pub fn render_context(&self) -> Result<RenderContext, ConfigurationError> {
        Ok(RenderContext::from_font_file(&self.font_path)?.with_jpeg_quality(self.jpeg_quality))
    }
}
