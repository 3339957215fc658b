use std::env;

use chrono::FixedOffset;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub notify_buffer_size: usize,
    /// The platform's fixed civil timezone, as minutes east of UTC. Display
    /// timestamps are always rendered in this zone, never in server or
    /// viewer local time.
    pub platform_utc_offset_minutes: i32,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let config = Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            notify_buffer_size: parse_or_default("NOTIFY_BUFFER_SIZE", 1024)?,
            platform_utc_offset_minutes: parse_or_default("PLATFORM_UTC_OFFSET_MINUTES", 480)?,
        };

        config.platform_offset()?;
        Ok(config)
    }

    pub fn platform_offset(&self) -> Result<FixedOffset, AppError> {
        FixedOffset::east_opt(self.platform_utc_offset_minutes * 60).ok_or_else(|| {
            AppError::Internal(format!(
                "invalid PLATFORM_UTC_OFFSET_MINUTES: {}",
                self.platform_utc_offset_minutes
            ))
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
