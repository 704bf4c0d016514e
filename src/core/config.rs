use std::env;

use thiserror::Error;

const DEFAULT_CORS_ORIGINS: &[&str] =
    &["http://localhost:5173", "http://localhost:3000", "http://localhost:8080"];

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    server: ServerSettings,
    runtime: RuntimeSettings,
    api: ApiSettings,
    cors: CorsSettings,
    ai: AiSettings,
    grading: GradingSettings,
    anticheat: AnticheatSettings,
    uploads: UploadSettings,
    speech: SpeechSettings,
    tts: TtsSettings,
    telemetry: TelemetrySettings,
}

#[derive(Debug, Clone)]
pub(crate) struct ServerSettings {
    host: ServerHost,
    port: ServerPort,
}

#[derive(Debug, Clone)]
pub(crate) struct RuntimeSettings {
    pub(crate) environment: Environment,
    pub(crate) strict_config: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct ApiSettings {
    pub(crate) project_name: String,
    pub(crate) version: String,
}

#[derive(Debug, Clone)]
pub(crate) struct CorsSettings {
    pub(crate) origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct AiSettings {
    pub(crate) gemini_api_key: String,
    pub(crate) gemini_base_url: String,
    pub(crate) gemini_model: String,
    pub(crate) gemini_extraction_model: String,
    pub(crate) claude_api_key: String,
    pub(crate) claude_base_url: String,
    pub(crate) claude_model: String,
    pub(crate) max_tokens: u32,
    pub(crate) request_timeout: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct GradingSettings {
    pub(crate) base_temperature: f64,
    pub(crate) alt_temperature: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct AnticheatSettings {
    pub(crate) temperature: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct UploadSettings {
    pub(crate) max_upload_size_mb: u64,
    pub(crate) allowed_audio_extensions: Vec<String>,
    pub(crate) allowed_video_extensions: Vec<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct SpeechSettings {
    pub(crate) base_url: String,
    pub(crate) language_code: String,
    pub(crate) poll_interval_seconds: u64,
    pub(crate) max_poll_attempts: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct TtsSettings {
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) voice_id: String,
    pub(crate) model_id: String,
}

#[derive(Debug, Clone)]
pub(crate) struct TelemetrySettings {
    pub(crate) log_level: String,
    pub(crate) json: bool,
    pub(crate) prometheus_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Environment {
    Development,
    Production,
    Staging,
    Test,
}

impl Environment {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Staging => "staging",
            Environment::Test => "test",
        }
    }

    fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ServerHost(String);

#[derive(Debug, Clone, Copy)]
pub(crate) struct ServerPort(u16);

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("invalid server host: {0}")]
    InvalidHost(String),
    #[error("invalid server port: {0}")]
    InvalidPort(String),
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("invalid cors origins: {0}")]
    InvalidCors(String),
    #[error("missing required secret for {0}")]
    MissingSecret(&'static str),
}

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("VIVA_HOST", "0.0.0.0");
        let port = env_or_default("VIVA_PORT", "8000");

        let environment =
            parse_environment(env_optional("VIVA_ENV").or_else(|| env_optional("ENVIRONMENT")));
        let strict_config =
            env_optional("VIVA_STRICT_CONFIG").map(|value| parse_bool(&value)).unwrap_or(false)
                || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "Viva API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let gemini_api_key = env_or_default("GEMINI_API_KEY", "");
        let gemini_base_url =
            env_or_default("GEMINI_BASE_URL", "https://generativelanguage.googleapis.com/v1beta");
        let gemini_model = env_or_default("GEMINI_MODEL", "gemini-3-pro-preview");
        let gemini_extraction_model =
            env_or_default("GEMINI_EXTRACTION_MODEL", "gemini-2.0-flash");
        let claude_api_key = env_or_default("CLAUDE_API_KEY", "");
        let claude_base_url = env_or_default("CLAUDE_BASE_URL", "https://api.anthropic.com/v1");
        let claude_model = env_or_default("CLAUDE_MODEL", "claude-sonnet-4-5");
        let max_tokens = parse_u32("AI_MAX_TOKENS", env_or_default("AI_MAX_TOKENS", "4096"))?;
        let request_timeout =
            parse_u64("AI_REQUEST_TIMEOUT", env_or_default("AI_REQUEST_TIMEOUT", "600"))?;

        let base_temperature = parse_f64(
            "GRADING_BASE_TEMPERATURE",
            env_or_default("GRADING_BASE_TEMPERATURE", "1.0"),
        )?;
        let alt_temperature = parse_f64(
            "GRADING_ALT_TEMPERATURE",
            env_or_default("GRADING_ALT_TEMPERATURE", "1.5"),
        )?;
        let anticheat_temperature =
            parse_f64("ANTICHEAT_TEMPERATURE", env_or_default("ANTICHEAT_TEMPERATURE", "0.5"))?;

        let max_upload_size_mb =
            parse_u64("MAX_UPLOAD_SIZE_MB", env_or_default("MAX_UPLOAD_SIZE_MB", "50"))?;
        let allowed_audio_extensions = parse_string_list(
            env_optional("ALLOWED_AUDIO_EXTENSIONS"),
            &["webm", "ogg", "wav", "flac", "mp3", "m4a"],
        );
        let allowed_video_extensions = parse_string_list(
            env_optional("ALLOWED_VIDEO_EXTENSIONS"),
            &["webm", "mp4", "mov"],
        );

        let speech_base_url =
            env_or_default("SPEECH_BASE_URL", "https://speech.googleapis.com/v1");
        let speech_language_code = env_or_default("SPEECH_LANGUAGE_CODE", "en-US");
        let speech_poll_interval_seconds = parse_u64(
            "SPEECH_POLL_INTERVAL_SECONDS",
            env_or_default("SPEECH_POLL_INTERVAL_SECONDS", "2"),
        )?;
        let speech_max_poll_attempts = parse_u32(
            "SPEECH_MAX_POLL_ATTEMPTS",
            env_or_default("SPEECH_MAX_POLL_ATTEMPTS", "300"),
        )?;

        let elevenlabs_api_key = env_or_default("ELEVENLABS_API_KEY", "");
        let elevenlabs_base_url =
            env_or_default("ELEVENLABS_BASE_URL", "https://api.elevenlabs.io/v1");
        let elevenlabs_voice_id = env_or_default("ELEVENLABS_VOICE_ID", "TX3LPaxmHKxFdv7VOQHJ");
        let elevenlabs_model_id = env_or_default("ELEVENLABS_MODEL_ID", "eleven_multilingual_v2");

        let log_level = env_or_default("VIVA_LOG_LEVEL", "info");
        let json = env_optional("VIVA_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version },
            cors: CorsSettings { origins: cors_origins },
            ai: AiSettings {
                gemini_api_key,
                gemini_base_url,
                gemini_model,
                gemini_extraction_model,
                claude_api_key,
                claude_base_url,
                claude_model,
                max_tokens,
                request_timeout,
            },
            grading: GradingSettings { base_temperature, alt_temperature },
            anticheat: AnticheatSettings { temperature: anticheat_temperature },
            uploads: UploadSettings {
                max_upload_size_mb,
                allowed_audio_extensions,
                allowed_video_extensions,
            },
            speech: SpeechSettings {
                base_url: speech_base_url,
                language_code: speech_language_code,
                poll_interval_seconds: speech_poll_interval_seconds,
                max_poll_attempts: speech_max_poll_attempts,
            },
            tts: TtsSettings {
                api_key: elevenlabs_api_key,
                base_url: elevenlabs_base_url,
                voice_id: elevenlabs_voice_id,
                model_id: elevenlabs_model_id,
            },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn ai(&self) -> &AiSettings {
        &self.ai
    }

    pub(crate) fn grading(&self) -> &GradingSettings {
        &self.grading
    }

    pub(crate) fn anticheat(&self) -> &AnticheatSettings {
        &self.anticheat
    }

    pub(crate) fn uploads(&self) -> &UploadSettings {
        &self.uploads
    }

    pub(crate) fn speech(&self) -> &SpeechSettings {
        &self.speech
    }

    pub(crate) fn tts(&self) -> &TtsSettings {
        &self.tts
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.uploads.allowed_audio_extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ALLOWED_AUDIO_EXTENSIONS",
                value: String::from("<empty>"),
            });
        }

        if self.uploads.allowed_video_extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ALLOWED_VIDEO_EXTENSIONS",
                value: String::from("<empty>"),
            });
        }

        if self.speech.poll_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "SPEECH_POLL_INTERVAL_SECONDS",
                value: "0".to_string(),
            });
        }

        if self.speech.max_poll_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "SPEECH_MAX_POLL_ATTEMPTS",
                value: "0".to_string(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.ai.gemini_api_key.is_empty() {
            return Err(ConfigError::MissingSecret("GEMINI_API_KEY"));
        }
        if self.ai.claude_api_key.is_empty() {
            return Err(ConfigError::MissingSecret("CLAUDE_API_KEY"));
        }
        if self.tts.api_key.is_empty() {
            return Err(ConfigError::MissingSecret("ELEVENLABS_API_KEY"));
        }

        Ok(())
    }
}

impl UploadSettings {
    pub(crate) fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }
}

impl ServerHost {
    fn parse(value: String) -> Result<Self, ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::InvalidHost(value));
        }
        Ok(Self(value))
    }
}

impl ServerPort {
    fn parse(value: String) -> Result<Self, ConfigError> {
        let parsed: u16 = value.parse().map_err(|_| ConfigError::InvalidPort(value.clone()))?;
        if parsed == 0 {
            return Err(ConfigError::InvalidPort(value));
        }
        Ok(Self(parsed))
    }
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn env_or_default(key: &str, default: &str) -> String {
    env_optional(key).unwrap_or_else(|| default.to_string())
}

fn parse_u32(field: &'static str, value: String) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidValue { field, value })
}

fn parse_u64(field: &'static str, value: String) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidValue { field, value })
}

fn parse_f64(field: &'static str, value: String) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| ConfigError::InvalidValue { field, value })
}

fn parse_cors_origins(value: Option<String>) -> Result<Vec<String>, ConfigError> {
    let Some(raw) = value else {
        return Ok(default_cors_origins());
    };

    if raw.trim().is_empty() {
        return Ok(default_cors_origins());
    }

    if raw.trim_start().starts_with('[') {
        let parsed: Vec<String> =
            serde_json::from_str(&raw).map_err(|_| ConfigError::InvalidCors(raw.clone()))?;
        if parsed.is_empty() {
            return Ok(default_cors_origins());
        }
        return Ok(parsed);
    }

    let items: Vec<String> = raw
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();

    if items.is_empty() {
        return Ok(default_cors_origins());
    }

    Ok(items)
}

fn parse_string_list(value: Option<String>, defaults: &[&str]) -> Vec<String> {
    match value {
        Some(raw) => raw
            .split(',')
            .map(|item| item.trim().to_ascii_lowercase())
            .filter(|item| !item.is_empty())
            .collect(),
        None => defaults.iter().map(|item| item.to_string()).collect(),
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES" | "on" | "ON")
}

fn parse_environment(value: Option<String>) -> Environment {
    match value.as_deref().map(|item| item.to_lowercase()) {
        Some(ref val) if val == "production" || val == "prod" => Environment::Production,
        Some(ref val) if val == "staging" => Environment::Staging,
        Some(ref val) if val == "test" || val == "testing" => Environment::Test,
        _ => Environment::Development,
    }
}

fn default_cors_origins() -> Vec<String> {
    DEFAULT_CORS_ORIGINS.iter().map(|item| item.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn parse_cors_origins_json() {
        let raw = "[\"http://a\",\"http://b\"]".to_string();
        let parsed = parse_cors_origins(Some(raw)).expect("cors json");
        assert_eq!(parsed, vec!["http://a".to_string(), "http://b".to_string()]);
    }

    #[test]
    fn parse_cors_origins_csv() {
        let raw = "http://a, http://b".to_string();
        let parsed = parse_cors_origins(Some(raw)).expect("cors csv");
        assert_eq!(parsed, vec!["http://a".to_string(), "http://b".to_string()]);
    }

    #[test]
    fn parse_cors_origins_defaults_on_empty() {
        let parsed = parse_cors_origins(Some(" ".to_string())).expect("cors empty");
        assert_eq!(parsed, default_cors_origins());
    }

    #[test]
    fn parse_bool_variants() {
        assert!(parse_bool("1"));
        assert!(parse_bool("true"));
        assert!(parse_bool("yes"));
        assert!(parse_bool("on"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
    }

    #[test]
    fn parse_environment_variants() {
        assert_eq!(parse_environment(Some("prod".to_string())), Environment::Production);
        assert_eq!(parse_environment(Some("production".to_string())), Environment::Production);
        assert_eq!(parse_environment(Some("staging".to_string())), Environment::Staging);
        assert_eq!(parse_environment(Some("testing".to_string())), Environment::Test);
        assert_eq!(parse_environment(None), Environment::Development);
    }

    #[test]
    fn parse_string_list_lowercases_and_trims() {
        let parsed = parse_string_list(Some("WEBM, Ogg ,mp3".to_string()), &["wav"]);
        assert_eq!(parsed, vec!["webm", "ogg", "mp3"]);
    }

    #[tokio::test]
    async fn load_applies_defaults() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let settings = Settings::load().expect("settings");
        assert_eq!(settings.ai().gemini_model, "gemini-3-pro-preview");
        assert_eq!(settings.ai().gemini_extraction_model, "gemini-2.0-flash");
        assert_eq!(settings.grading().base_temperature, 1.0);
        assert_eq!(settings.grading().alt_temperature, 1.5);
        assert_eq!(settings.anticheat().temperature, 0.5);
        assert_eq!(settings.uploads().max_upload_size_mb, 50);
        assert_eq!(settings.speech().language_code, "en-US");
    }

    #[tokio::test]
    async fn strict_mode_requires_gemini_key() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("VIVA_STRICT_CONFIG", "1");
        std::env::remove_var("GEMINI_API_KEY");

        let err = Settings::load().expect_err("strict load should fail");
        assert!(matches!(err, ConfigError::MissingSecret("GEMINI_API_KEY")));
    }
}
