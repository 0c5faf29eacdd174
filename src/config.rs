pub const DEFAULT_MESSAGE_FORMAT: &str = "{asctime} {levelname}: [{name}] {message}";
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const MESSAGE_FORMAT_ENV: &str = "LABELLOG_MESSAGE_FORMAT";
pub const DATETIME_FORMAT_ENV: &str = "LABELLOG_DATE_FORMAT";

/// Line layout shared by every sink attached through one logger.
///
/// `message_format` understands the placeholders `{asctime}`, `{levelname}`,
/// `{levelno}`, `{name}` and `{message}`. `datetime_format` is a chrono
/// strftime pattern used to render `{asctime}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub message_format: String,
    pub datetime_format: String,
}

impl Config {
    pub fn new() -> Self {
        Self {
            message_format: DEFAULT_MESSAGE_FORMAT.to_string(),
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
        }
    }

    /// Defaults, overridden by `LABELLOG_MESSAGE_FORMAT` and
    /// `LABELLOG_DATE_FORMAT` when they are set and non-empty.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::new();

        if let Some(format) = lookup(MESSAGE_FORMAT_ENV).filter(|v| !v.is_empty()) {
            config.message_format = format;
        }

        if let Some(format) = lookup(DATETIME_FORMAT_ENV).filter(|v| !v.is_empty()) {
            config.datetime_format = format;
        }

        config
    }

    pub fn with_message_format(self, message_format: impl Into<String>) -> Self {
        Self {
            message_format: message_format.into(),
            ..self
        }
    }

    pub fn with_datetime_format(self, datetime_format: impl Into<String>) -> Self {
        Self {
            datetime_format: datetime_format.into(),
            ..self
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.message_format, DEFAULT_MESSAGE_FORMAT);
        assert_eq!(config.datetime_format, DEFAULT_DATETIME_FORMAT);
    }

    #[test]
    fn test_config_lookup_overrides() {
        let config = Config::from_lookup(|key| match key {
            MESSAGE_FORMAT_ENV => Some("{levelname} {message}".to_string()),
            DATETIME_FORMAT_ENV => Some("%H:%M".to_string()),
            _ => None,
        });

        assert_eq!(config.message_format, "{levelname} {message}");
        assert_eq!(config.datetime_format, "%H:%M");
    }

    // empty values fall back to the defaults
    #[test]
    fn test_config_lookup_ignores_empty_values() {
        let config = Config::from_lookup(|_| Some(String::new()));
        assert_eq!(config, Config::new());
    }
}
