use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};

use super::{LogFormatter, Record};
use crate::config::{Config, DEFAULT_DATETIME_FORMAT};

pub struct DefaultFormatter {
    config: Config,
}

impl DefaultFormatter {
    /// An unparseable `datetime_format` falls back to the default pattern,
    /// since chrono panics while rendering invalid strftime items.
    pub fn new(config: Config) -> Self {
        let mut config = config;
        if !is_valid_datetime_format(&config.datetime_format) {
            eprintln!(
                "[labellog] Invalid date format '{}', using '{}'",
                config.datetime_format, DEFAULT_DATETIME_FORMAT
            );
            config.datetime_format = DEFAULT_DATETIME_FORMAT.to_string();
        }

        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn field(&self, key: &str, record: &Record<'_>, out: &mut String) -> bool {
        match key {
            "asctime" => {
                let _ = write!(out, "{}", record.timestamp.format(&self.config.datetime_format));
            }
            "levelname" => out.push_str(record.severity.as_str()),
            "levelno" => {
                let _ = write!(out, "{}", record.severity.rank());
            }
            "name" => out.push_str(record.label),
            "message" => out.push_str(record.message),
            _ => return false,
        }

        true
    }
}

impl Default for DefaultFormatter {
    fn default() -> Self {
        Self::new(Config::new())
    }
}

impl LogFormatter for DefaultFormatter {
    fn format(&self, record: &Record<'_>) -> String {
        let template = self.config.message_format.as_str();
        let mut out = String::with_capacity(template.len() + record.message.len() + 32);
        let mut rest = template;

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];

            let Some(end) = tail.find('}') else {
                out.push_str(tail);
                return out;
            };

            if !self.field(&tail[1..end], record, &mut out) {
                out.push_str(&tail[..=end]);
            }
            rest = &tail[end + 1..];
        }

        out.push_str(rest);
        out
    }
}

fn is_valid_datetime_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}
