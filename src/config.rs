use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use chrono::{FixedOffset, NaiveTime, Offset, Utc, Weekday};
use dotenvy::dotenv;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub db_max_connections: u32,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_dir: String,

    pub scheduler: SchedulerConfig,
}

/// Wall-clock settings shared by the request path and the background jobs.
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub utc_offset: FixedOffset,
    pub auto_clock_out_at: NaiveTime,
    pub absence_check_at: NaiveTime,
    pub audit_retention_hours: i64,
    pub rest_day: Weekday,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            utc_offset: Utc.fix(),
            auto_clock_out_at: NaiveTime::from_hms_opt(23, 30, 0).expect("valid time"),
            absence_check_at: NaiveTime::from_hms_opt(0, 5, 0).expect("valid time"),
            audit_retention_hours: 24,
            rest_day: Weekday::Sun,
        }
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).map_err(|_| anyhow!("{key} must be set"))
}

fn parsed_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key} is invalid: {e}")),
        Err(_) => Ok(default),
    }
}

fn time_or(key: &str, default: NaiveTime) -> Result<NaiveTime> {
    match env::var(key) {
        Ok(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M")
            .with_context(|| format!("{key} must be HH:MM")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let defaults = SchedulerConfig::default();

        let offset_minutes: i32 = parsed_or("UTC_OFFSET_MINUTES", 0)?;
        let utc_offset = FixedOffset::east_opt(offset_minutes * 60)
            .ok_or_else(|| anyhow!("UTC_OFFSET_MINUTES out of range: {offset_minutes}"))?;

        let rest_day = match env::var("REST_DAY") {
            Ok(raw) => raw
                .trim()
                .parse::<Weekday>()
                .map_err(|_| anyhow!("REST_DAY is not a weekday: {raw}"))?,
            Err(_) => defaults.rest_day,
        };

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            db_max_connections: parsed_or("DB_MAX_CONNECTIONS", 10)?,

            rate_protected_per_min: parsed_or("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),

            scheduler: SchedulerConfig {
                enabled: parsed_or("SCHEDULER_ENABLED", true)?,
                utc_offset,
                auto_clock_out_at: time_or("AUTO_CLOCK_OUT_AT", defaults.auto_clock_out_at)?,
                absence_check_at: time_or("ABSENCE_CHECK_AT", defaults.absence_check_at)?,
                audit_retention_hours: parsed_or("AUDIT_RETENTION_HOURS", 24)?,
                rest_day,
            },
        })
    }
}
