use async_openai::types::Voice;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

pub const DEFAULT_DATABASE_URL: &str = "sqlite:preschool_learning.db";
pub const TTS_SPEED_RANGE: std::ops::RangeInclusive<f32> = 0.25..=4.0;

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_api_base: String,
    pub chat_model: String,
    pub database_url: String,
    pub log_level: Level,
    /// Directory of `*.md` prompt overrides; built-in prompts are used when unset.
    pub prompts_path: Option<PathBuf>,
    pub tts_model: String,
    pub tts_voice: Voice,
    pub tts_speed: f32,
    pub transcription_model: String,
    /// Recording sample rate used when the input device does not report one.
    pub sample_rate: u32,
    pub max_turns: usize,
    pub response_timeout: Duration,
    /// Longest reply, in characters, that is sent to speech synthesis.
    pub max_response_length: usize,
    pub max_consecutive_errors: u32,
    pub save_sessions: bool,
    /// Student to teach from `TUTOR_STUDENT`; asked for at startup when unset.
    pub student: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))?;

        let openai_api_base = std::env::var("OPENAI_API_BASE")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let chat_model = std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "WARN".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let prompts_path = std::env::var("PROMPTS_PATH").ok().map(PathBuf::from);

        let tts_model = std::env::var("TTS_MODEL").unwrap_or_else(|_| "tts-1".to_string());
        let tts_voice_str = std::env::var("TTS_VOICE").unwrap_or_else(|_| "alloy".to_string());
        let tts_voice = parse_voice(&tts_voice_str).ok_or_else(|| {
            ConfigError::InvalidValue(
                "TTS_VOICE".to_string(),
                format!("'{}' is not a supported voice", tts_voice_str),
            )
        })?;
        let tts_speed: f32 = parse_var("TTS_SPEED", 0.9)?;
        if !TTS_SPEED_RANGE.contains(&tts_speed) {
            return Err(ConfigError::InvalidValue(
                "TTS_SPEED".to_string(),
                format!("{} is outside 0.25 to 4.0", tts_speed),
            ));
        }
        let transcription_model =
            std::env::var("TRANSCRIPTION_MODEL").unwrap_or_else(|_| "whisper-1".to_string());

        let sample_rate: u32 = parse_var("SAMPLE_RATE", 44_100)?;
        let max_turns: usize = parse_var("MAX_TURNS", 10)?;
        let response_timeout_secs: u64 = parse_var("RESPONSE_TIMEOUT_SECS", 30)?;
        let max_response_length: usize = parse_var("MAX_RESPONSE_LENGTH", 200)?;
        let max_consecutive_errors: u32 = parse_var("MAX_CONSECUTIVE_ERRORS", 3)?;
        let save_sessions: bool = parse_var("SAVE_SESSIONS", true)?;
        let student = std::env::var("TUTOR_STUDENT")
            .ok()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        for (name, value) in [
            ("SAMPLE_RATE", sample_rate as u64),
            ("MAX_TURNS", max_turns as u64),
            ("RESPONSE_TIMEOUT_SECS", response_timeout_secs),
            ("MAX_RESPONSE_LENGTH", max_response_length as u64),
            ("MAX_CONSECUTIVE_ERRORS", max_consecutive_errors as u64),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue(
                    name.to_string(),
                    "must be greater than zero".to_string(),
                ));
            }
        }

        Ok(Self {
            openai_api_key,
            openai_api_base,
            chat_model,
            database_url,
            log_level,
            prompts_path,
            tts_model,
            tts_voice,
            tts_speed,
            transcription_model,
            sample_rate,
            max_turns,
            response_timeout: Duration::from_secs(response_timeout_secs),
            max_response_length,
            max_consecutive_errors,
            save_sessions,
            student,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("'{}': {}", raw, e))),
        Err(_) => Ok(default),
    }
}

fn parse_voice(name: &str) -> Option<Voice> {
    match name.trim().to_lowercase().as_str() {
        "alloy" => Some(Voice::Alloy),
        "echo" => Some(Voice::Echo),
        "fable" => Some(Voice::Fable),
        "onyx" => Some(Voice::Onyx),
        "nova" => Some(Voice::Nova),
        "shimmer" => Some(Voice::Shimmer),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tracing::Level;

    const ALL_VARS: [&str; 17] = [
        "OPENAI_API_KEY",
        "OPENAI_API_BASE",
        "CHAT_MODEL",
        "DATABASE_URL",
        "RUST_LOG",
        "PROMPTS_PATH",
        "TTS_MODEL",
        "TTS_VOICE",
        "TTS_SPEED",
        "TRANSCRIPTION_MODEL",
        "SAMPLE_RATE",
        "MAX_TURNS",
        "RESPONSE_TIMEOUT_SECS",
        "MAX_RESPONSE_LENGTH",
        "MAX_CONSECUTIVE_ERRORS",
        "SAVE_SESSIONS",
        "TUTOR_STUDENT",
    ];

    fn clear_env_vars() {
        unsafe {
            for var in ALL_VARS {
                env::remove_var(var);
            }
        }
    }

    fn set_minimal_env() {
        unsafe {
            env::set_var("OPENAI_API_KEY", "test-openai-key");
        }
    }

    fn expect_invalid(var: &str) {
        match Config::from_env().unwrap_err() {
            ConfigError::InvalidValue(name, _) => assert_eq!(name, var),
            other => panic!("Expected InvalidValue for {}, got {:?}", var, other),
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );

        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_from_env_defaults() {
        clear_env_vars();
        set_minimal_env();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.openai_api_key, "test-openai-key");
        assert_eq!(config.openai_api_base, "https://api.openai.com/v1");
        assert_eq!(config.chat_model, "gpt-4o-mini");
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.log_level, Level::WARN);
        assert_eq!(config.prompts_path, None);
        assert_eq!(config.tts_model, "tts-1");
        assert!(matches!(config.tts_voice, Voice::Alloy));
        assert!((config.tts_speed - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.transcription_model, "whisper-1");
        assert_eq!(config.sample_rate, 44_100);
        assert_eq!(config.max_turns, 10);
        assert_eq!(config.response_timeout, Duration::from_secs(30));
        assert_eq!(config.max_response_length, 200);
        assert_eq!(config.max_consecutive_errors, 3);
        assert!(config.save_sessions);
        assert_eq!(config.student, None);
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("CHAT_MODEL", "gpt-4o");
            env::set_var("DATABASE_URL", "sqlite::memory:");
            env::set_var("RUST_LOG", "debug");
            env::set_var("PROMPTS_PATH", "/custom/prompts");
            env::set_var("TTS_VOICE", "Nova");
            env::set_var("TTS_SPEED", "1.25");
            env::set_var("MAX_TURNS", "4");
            env::set_var("SAVE_SESSIONS", "false");
            env::set_var("TUTOR_STUDENT", " Liam ");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.chat_model, "gpt-4o");
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.prompts_path, Some(PathBuf::from("/custom/prompts")));
        assert!(matches!(config.tts_voice, Voice::Nova));
        assert!((config.tts_speed - 1.25).abs() < f32::EPSILON);
        assert_eq!(config.max_turns, 4);
        assert!(!config.save_sessions);
        assert_eq!(config.student.as_deref(), Some("Liam"));
    }

    #[test]
    #[serial]
    fn test_config_missing_openai_key() {
        clear_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "   ");
        }

        match Config::from_env().unwrap_err() {
            ConfigError::MissingVar(msg) => assert!(msg.contains("OPENAI_API_KEY")),
            _ => panic!("Expected MissingVar for OPENAI_API_KEY"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("RUST_LOG", "not-a-level");
        }
        expect_invalid("RUST_LOG");
    }

    #[test]
    #[serial]
    fn test_config_tts_speed_out_of_range() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("TTS_SPEED", "5.0");
        }
        expect_invalid("TTS_SPEED");
    }

    #[test]
    #[serial]
    fn test_config_unknown_voice() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("TTS_VOICE", "robot");
        }
        expect_invalid("TTS_VOICE");
    }

    #[test]
    #[serial]
    fn test_config_zero_timeout_rejected() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("RESPONSE_TIMEOUT_SECS", "0");
        }
        expect_invalid("RESPONSE_TIMEOUT_SECS");
    }

    #[test]
    #[serial]
    fn test_config_non_numeric_value() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("MAX_CONSECUTIVE_ERRORS", "three");
        }
        expect_invalid("MAX_CONSECUTIVE_ERRORS");
    }
}
