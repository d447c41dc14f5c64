use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use anyhow::{Result, anyhow};

use crate::prompt::Unmatched;

pub const GEMINI_KEY_ENV: &str = "API_KEY";
pub const ELEVEN_LABS_KEY_ENV: &str = "ELEVEN_LABS_API_KEY";
pub const DATA_DIR_ENV: &str = "CONTENTCRAFT_DATA_DIR";

pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_SPEECH_MODEL: &str = "eleven_monolingual_v1";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_ELEVEN_LABS_BASE_URL: &str = "https://api.elevenlabs.io";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub eleven_labs_api_key: Option<String>,
    pub text_model: Option<String>,
    pub image_model: Option<String>,
    pub speech_model: Option<String>,
    pub gemini_base_url: Option<String>,
    pub eleven_labs_base_url: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
    pub unmatched_placeholders: Option<Unmatched>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `.env.local` and `.env` into the process environment, if present.
    /// Variables already set win.
    pub fn load_dotenv() {
        for file in [".env.local", ".env"] {
            match dotenvy::from_filename(file) {
                Ok(path) => tracing::debug!("loaded environment from {:?}", path),
                Err(e) if e.not_found() => {}
                Err(e) => tracing::warn!("ignoring {}: {}", file, e),
            }
        }
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(&config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("contentcraft").join("config.json"))
    }

    /// Gemini key: `API_KEY` in the environment, then the config file.
    pub fn gemini_key(&self) -> Option<String> {
        non_blank(std::env::var(GEMINI_KEY_ENV).ok()).or_else(|| non_blank(self.gemini_api_key.clone()))
    }

    pub fn eleven_labs_key(&self) -> Option<String> {
        non_blank(std::env::var(ELEVEN_LABS_KEY_ENV).ok())
            .or_else(|| non_blank(self.eleven_labs_api_key.clone()))
    }

    pub fn text_model(&self) -> &str {
        self.text_model.as_deref().unwrap_or(DEFAULT_TEXT_MODEL)
    }

    pub fn image_model(&self) -> &str {
        self.image_model.as_deref().unwrap_or(DEFAULT_IMAGE_MODEL)
    }

    pub fn speech_model(&self) -> &str {
        self.speech_model.as_deref().unwrap_or(DEFAULT_SPEECH_MODEL)
    }

    pub fn gemini_base_url(&self) -> &str {
        self.gemini_base_url.as_deref().unwrap_or(DEFAULT_GEMINI_BASE_URL)
    }

    pub fn eleven_labs_base_url(&self) -> &str {
        self.eleven_labs_base_url.as_deref().unwrap_or(DEFAULT_ELEVEN_LABS_BASE_URL)
    }

    pub fn unmatched(&self) -> Unmatched {
        self.unmatched_placeholders.unwrap_or_default()
    }

    /// Where the history database and logs live.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                return Ok(PathBuf::from(dir));
            }
        }
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow!("Could not determine data directory"))?;
        Ok(data_dir.join("contentcraft"))
    }

    pub fn history_db_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("history.sqlite"))
    }

    /// Downloads go to the configured export dir, the user's download
    /// folder, or the working directory, in that order.
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.text_model(), "gemini-2.5-flash");
        assert_eq!(config.image_model(), "gemini-2.5-flash-image");
        assert_eq!(config.unmatched(), Unmatched::Erase);
    }

    #[test]
    fn test_parses_partial_file() {
        let config: Config = serde_json::from_str(
            r#"{"text_model": "gemini-pro", "unmatched_placeholders": "keep", "export_dir": "/tmp/out"}"#,
        )
        .unwrap();
        assert_eq!(config.text_model(), "gemini-pro");
        assert_eq!(config.unmatched(), Unmatched::Keep);
        assert_eq!(config.export_dir(), PathBuf::from("/tmp/out"));
        assert!(config.eleven_labs_api_key.is_none());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ".to_string())), None);
        assert_eq!(non_blank(Some("k".to_string())), Some("k".to_string()));
    }
}
