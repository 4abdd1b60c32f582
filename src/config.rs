use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub session: SessionFileConfig,
    pub audio: AudioConfig,
}

/// Live session configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionFileConfig {
    pub model: String,
    pub voice: String,
    pub endpoint: String,
}

/// Audio device configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AudioConfig {
    pub input_device: Option<String>,
}

impl Default for SessionFileConfig {
    fn default() -> Self {
        Self {
            model: defaults::DEFAULT_MODEL.to_string(),
            voice: defaults::DEFAULT_VOICE.to_string(),
            endpoint: defaults::LIVE_ENDPOINT.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// A missing file yields the defaults silently; invalid TOML is reported
    /// to stderr and also yields the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                let not_found = e
                    .downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false);
                if !not_found {
                    eprintln!("voxline: ignoring invalid config at {}: {}", path.display(), e);
                }
                Self::default()
            }
        }
    }
}

/// Parameters for one live session.
///
/// The API key is an explicit field here; the library never reads
/// process-wide state for credentials.
#[derive(Debug, Clone)]
pub struct LiveConfig {
    /// API key sent as a query parameter on the websocket URL.
    pub api_key: String,
    /// Live model identifier, with or without the `models/` prefix.
    pub model: String,
    /// Prebuilt voice for synthesized replies. `None` leaves the choice to
    /// the endpoint.
    pub voice: Option<String>,
    /// Websocket endpoint URL.
    pub endpoint: String,
}

impl LiveConfig {
    /// Creates a session config with default model, voice, and endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: defaults::DEFAULT_MODEL.to_string(),
            voice: Some(defaults::DEFAULT_VOICE.to_string()),
            endpoint: defaults::LIVE_ENDPOINT.to_string(),
        }
    }

    /// Builds session parameters from file config plus an explicit API key.
    pub fn from_config(config: &Config, api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: config.session.model.clone(),
            voice: Some(config.session.voice.clone()),
            endpoint: config.session.endpoint.clone(),
        }
    }

    /// Overrides the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the voice.
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    /// Overrides the endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// The model id in the `models/<name>` form the endpoint expects.
    pub fn qualified_model(&self) -> String {
        if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.session.model, defaults::DEFAULT_MODEL);
        assert_eq!(config.session.voice, defaults::DEFAULT_VOICE);
        assert_eq!(config.audio.input_device, None);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[session]\nvoice = \"Puck\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.session.voice, "Puck");
        assert_eq!(config.session.model, defaults::DEFAULT_MODEL);
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not valid = = toml").unwrap();

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/voxline.toml"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_invalid_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "<<<").unwrap();

        let config = Config::load_or_default(file.path());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_live_config_defaults() {
        let live = LiveConfig::new("key");
        assert_eq!(live.api_key, "key");
        assert_eq!(live.model, defaults::DEFAULT_MODEL);
        assert_eq!(live.voice.as_deref(), Some(defaults::DEFAULT_VOICE));
        assert_eq!(live.endpoint, defaults::LIVE_ENDPOINT);
    }

    #[test]
    fn test_live_config_builders() {
        let live = LiveConfig::new("key")
            .with_model("other-model")
            .with_voice("Puck")
            .with_endpoint("wss://example.test/live");
        assert_eq!(live.model, "other-model");
        assert_eq!(live.voice.as_deref(), Some("Puck"));
        assert_eq!(live.endpoint, "wss://example.test/live");
    }

    #[test]
    fn test_qualified_model_adds_prefix_once() {
        let live = LiveConfig::new("key").with_model("some-model");
        assert_eq!(live.qualified_model(), "models/some-model");

        let live = live.with_model("models/some-model");
        assert_eq!(live.qualified_model(), "models/some-model");
    }

    #[test]
    fn test_from_config_carries_session_fields() {
        let mut config = Config::default();
        config.session.model = "m".to_string();
        config.session.voice = "v".to_string();
        config.session.endpoint = "wss://e".to_string();

        let live = LiveConfig::from_config(&config, "key");
        assert_eq!(live.model, "m");
        assert_eq!(live.voice.as_deref(), Some("v"));
        assert_eq!(live.endpoint, "wss://e");
        assert_eq!(live.api_key, "key");
    }
}
