use crate::defaults;
use crate::error::{Result, VoxlateError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub services: ServicesConfig,
    pub translation: TranslationConfig,
    pub audio: AudioConfig,
    pub history: HistoryConfig,
    pub interactive: InteractiveConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub public_dir: PathBuf,
    pub public_url_prefix: String,
    pub max_upload_bytes: usize,
    /// Append served translations to the history log as well.
    pub record_history: bool,
}

/// Which implementation backs the three speech services
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Network-backed services
    #[default]
    Remote,
    /// Deterministic offline stubs
    Stub,
}

impl std::str::FromStr for Backend {
    type Err = VoxlateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(Self::Remote),
            "stub" | "offline" => Ok(Self::Stub),
            other => Err(VoxlateError::ConfigInvalidValue {
                key: "services.backend".to_string(),
                message: format!("expected 'remote' or 'stub', got '{other}'"),
            }),
        }
    }
}

/// Backend service endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServicesConfig {
    pub backend: Backend,
    pub transcription_url: String,
    pub transcription_model: String,
    pub api_key: Option<String>,
    pub translation_url: String,
    pub synthesis_url: String,
    /// Per-request timeout for backend calls. None waits indefinitely.
    pub timeout_secs: Option<u64>,
}

/// Language defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranslationConfig {
    pub source_language: String,
    pub target_language: String,
}

/// Microphone configuration for the interactive loop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub calibration_ms: u32,
    pub min_threshold: f32,
    pub ambient_multiplier: f32,
    pub silence_duration_ms: u32,
    pub phrase_timeout_secs: u64,
    pub max_phrase_secs: u64,
}

/// History log configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    /// Defaults to `$XDG_DATA_HOME/voxlate/history.json` when unset.
    pub path: Option<PathBuf>,
    pub recent_count: usize,
}

/// Interactive loop timing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InteractiveConfig {
    pub poll_interval_ms: u64,
    pub error_backoff_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: defaults::DEFAULT_BIND.to_string(),
            public_dir: PathBuf::from(defaults::PUBLIC_DIR),
            public_url_prefix: defaults::PUBLIC_URL_PREFIX.to_string(),
            max_upload_bytes: defaults::MAX_UPLOAD_BYTES,
            record_history: false,
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Remote,
            transcription_url: defaults::TRANSCRIPTION_URL.to_string(),
            transcription_model: defaults::TRANSCRIPTION_MODEL.to_string(),
            api_key: None,
            translation_url: defaults::TRANSLATION_URL.to_string(),
            synthesis_url: defaults::SYNTHESIS_URL.to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            source_language: defaults::DEFAULT_SOURCE_LANGUAGE.to_string(),
            target_language: defaults::DEFAULT_TARGET_LANGUAGE.to_string(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            calibration_ms: defaults::CALIBRATION_MS,
            min_threshold: defaults::MIN_SPEECH_THRESHOLD,
            ambient_multiplier: defaults::AMBIENT_MULTIPLIER,
            silence_duration_ms: defaults::SILENCE_DURATION_MS,
            phrase_timeout_secs: defaults::PHRASE_TIMEOUT_SECS,
            max_phrase_secs: defaults::MAX_PHRASE_SECS,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            recent_count: defaults::RECENT_HISTORY_COUNT,
        }
    }
}

impl Default for InteractiveConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: defaults::POLL_INTERVAL_MS,
            error_backoff_ms: defaults::ERROR_BACKOFF_MS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file is missing or contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VoxlateError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                VoxlateError::Io(e)
            }
        })?;
        toml::from_str(&contents).map_err(|e| VoxlateError::ConfigParse {
            message: e.to_string(),
        })
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only a missing file falls back to defaults; invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(VoxlateError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VOXLATE_TARGET_LANG → translation.target_language
    /// - VOXLATE_BIND → server.bind
    /// - VOXLATE_BACKEND → services.backend
    /// - VOXLATE_API_KEY → services.api_key
    /// - VOXLATE_HISTORY → history.path
    /// - VOXLATE_AUDIO_DEVICE → audio.device
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(lang) = std::env::var("VOXLATE_TARGET_LANG")
            && !lang.is_empty()
        {
            self.translation.target_language = lang;
        }

        if let Ok(bind) = std::env::var("VOXLATE_BIND")
            && !bind.is_empty()
        {
            self.server.bind = bind;
        }

        if let Ok(backend) = std::env::var("VOXLATE_BACKEND")
            && !backend.is_empty()
        {
            self.services.backend = backend.parse()?;
        }

        if let Ok(key) = std::env::var("VOXLATE_API_KEY")
            && !key.is_empty()
        {
            self.services.api_key = Some(key);
        }

        if let Ok(path) = std::env::var("VOXLATE_HISTORY")
            && !path.is_empty()
        {
            self.history.path = Some(PathBuf::from(path));
        }

        if let Ok(device) = std::env::var("VOXLATE_AUDIO_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        Ok(self)
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/voxlate/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("voxlate")
            .join("config.toml")
    }

    /// Resolved location of the history file.
    pub fn history_path(&self) -> PathBuf {
        self.history.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("voxlate")
                .join(defaults::HISTORY_FILE_NAME)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_voxlate_env() {
        for key in [
            "VOXLATE_TARGET_LANG",
            "VOXLATE_BIND",
            "VOXLATE_BACKEND",
            "VOXLATE_API_KEY",
            "VOXLATE_HISTORY",
            "VOXLATE_AUDIO_DEVICE",
        ] {
            remove_env(key);
        }
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.server.bind, "127.0.0.1:5000");
        assert_eq!(config.server.public_dir, PathBuf::from("static"));
        assert_eq!(config.server.public_url_prefix, "/static");
        assert_eq!(config.server.max_upload_bytes, 16 * 1024 * 1024);
        assert!(!config.server.record_history);

        assert_eq!(config.services.backend, Backend::Remote);
        assert_eq!(config.services.timeout_secs, None);
        assert_eq!(config.services.api_key, None);

        assert_eq!(config.translation.source_language, "en");
        assert_eq!(config.translation.target_language, "hi");

        assert_eq!(config.audio.device, None);
        assert_eq!(config.history.recent_count, 5);
        assert_eq!(config.interactive.poll_interval_ms, 500);
        assert_eq!(config.interactive.error_backoff_ms, 1000);
    }

    #[test]
    fn test_load_from_toml_file() {
        let toml_content = r#"
            [server]
            bind = "0.0.0.0:8080"
            public_dir = "/srv/voxlate"
            record_history = true

            [services]
            backend = "stub"
            transcription_url = "http://asr.local/v1/audio/transcriptions"
            api_key = "secret"
            timeout_secs = 20

            [translation]
            source_language = "de"
            target_language = "fr"

            [audio]
            device = "pulse"
            silence_duration_ms = 1200

            [history]
            path = "/var/lib/voxlate/history.json"
            recent_count = 10

            [interactive]
            poll_interval_ms = 250
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.server.public_dir, PathBuf::from("/srv/voxlate"));
        assert!(config.server.record_history);
        assert_eq!(config.services.backend, Backend::Stub);
        assert_eq!(
            config.services.transcription_url,
            "http://asr.local/v1/audio/transcriptions"
        );
        assert_eq!(config.services.api_key.as_deref(), Some("secret"));
        assert_eq!(config.services.timeout_secs, Some(20));
        assert_eq!(config.translation.source_language, "de");
        assert_eq!(config.translation.target_language, "fr");
        assert_eq!(config.audio.device.as_deref(), Some("pulse"));
        assert_eq!(config.audio.silence_duration_ms, 1200);
        assert_eq!(
            config.history_path(),
            PathBuf::from("/var/lib/voxlate/history.json")
        );
        assert_eq!(config.history.recent_count, 10);
        assert_eq!(config.interactive.poll_interval_ms, 250);
        assert_eq!(config.interactive.error_backoff_ms, 1000);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let toml_content = r#"
            [translation]
            target_language = "ja"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.translation.target_language, "ja");
        assert_eq!(config.translation.source_language, "en");
        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.services, ServicesConfig::default());
    }

    #[test]
    fn test_invalid_toml_returns_parse_error() {
        let invalid_toml = r#"
            [server
            bind = "broken
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(invalid_toml.as_bytes()).unwrap();

        let result = Config::load(temp_file.path());
        assert!(matches!(result, Err(VoxlateError::ConfigParse { .. })));
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[services]\nbackend = \"carrier-pigeon\"\n")
            .unwrap();

        assert!(Config::load(temp_file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_returns_default_for_missing_file() {
        let missing_path = Path::new("/tmp/nonexistent_voxlate_config_12345.toml");
        let config = Config::load_or_default(missing_path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_errors_on_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[audio\n").unwrap();

        assert!(Config::load_or_default(temp_file.path()).is_err());
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("remote".parse::<Backend>().unwrap(), Backend::Remote);
        assert_eq!("STUB".parse::<Backend>().unwrap(), Backend::Stub);
        assert_eq!("offline".parse::<Backend>().unwrap(), Backend::Stub);
        assert!("other".parse::<Backend>().is_err());
    }

    #[test]
    fn test_env_override_target_and_backend() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_voxlate_env();

        set_env("VOXLATE_TARGET_LANG", "es");
        set_env("VOXLATE_BACKEND", "stub");
        let config = Config::default().with_env_overrides().unwrap();

        assert_eq!(config.translation.target_language, "es");
        assert_eq!(config.services.backend, Backend::Stub);
        assert_eq!(config.server.bind, "127.0.0.1:5000");

        clear_voxlate_env();
    }

    #[test]
    fn test_env_override_all() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_voxlate_env();

        set_env("VOXLATE_BIND", "0.0.0.0:9000");
        set_env("VOXLATE_API_KEY", "k");
        set_env("VOXLATE_HISTORY", "/tmp/voxlate-history.json");
        set_env("VOXLATE_AUDIO_DEVICE", "hw:1,0");

        let config = Config::default().with_env_overrides().unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.services.api_key.as_deref(), Some("k"));
        assert_eq!(
            config.history_path(),
            PathBuf::from("/tmp/voxlate-history.json")
        );
        assert_eq!(config.audio.device.as_deref(), Some("hw:1,0"));

        clear_voxlate_env();
    }

    #[test]
    fn test_env_override_empty_string_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_voxlate_env();

        set_env("VOXLATE_TARGET_LANG", "");
        let config = Config::default().with_env_overrides().unwrap();
        assert_eq!(config.translation.target_language, "hi");

        clear_voxlate_env();
    }

    #[test]
    fn test_env_override_invalid_backend_errors() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_voxlate_env();

        set_env("VOXLATE_BACKEND", "nope");
        assert!(Config::default().with_env_overrides().is_err());

        clear_voxlate_env();
    }

    #[test]
    fn test_default_path_ends_with_config_toml() {
        let path = Config::default_path();
        let path_str = path.to_string_lossy();

        assert!(path_str.contains("voxlate"));
        assert!(path_str.ends_with("config.toml"));
    }

    #[test]
    fn test_default_history_path_ends_with_history_json() {
        let config = Config::default();
        assert!(config.history_path().ends_with("voxlate/history.json"));
    }
}
