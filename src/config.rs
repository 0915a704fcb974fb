use std::env;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

/// Runtime configuration, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub api_base_url: String,
    /// Account to track when starting with an empty store.
    pub tracked_account_id: Option<i64>,
    pub target_process: String,
    pub poll_interval: Duration,
    pub liveness_interval: Duration,
    pub cycle_timeout: Duration,
    pub request_max_retries: u32,
    pub api_rate_limit_per_second: NonZeroU32,
    pub diagnostic_log_path: PathBuf,
    pub diagnostic_log_max_lines: usize,
    pub name_refresh_limit: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        const DEFAULT_API_BASE_URL: &str = "https://aoe4world.com/api/v0";
        const DEFAULT_TARGET_PROCESS: &str = "RelicCardinal.exe";
        const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
        const DEFAULT_LIVENESS_INTERVAL_SECS: u64 = 5;
        const DEFAULT_CYCLE_TIMEOUT_SECS: u64 = 80;
        const DEFAULT_REQUEST_MAX_RETRIES: u32 = 10;
        const DEFAULT_API_RATE_LIMIT_PER_SECOND: u32 = 5;
        const DEFAULT_DIAGNOSTIC_LOG_MAX_LINES: usize = 1000;
        const DEFAULT_NAME_REFRESH_LIMIT: u32 = 6;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:aoe4mmr.db?mode=rwc".into());

        let api_base_url = env::var("API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.into())
            .trim_end_matches('/')
            .to_string();

        let tracked_account_id = match env::var("TRACKED_ACCOUNT_ID") {
            Ok(raw) => Some(raw.trim().parse().map_err(|_| {
                AppError::Config(format!("TRACKED_ACCOUNT_ID must be numeric, got {raw:?}"))
            })?),
            Err(_) => None,
        };

        let target_process =
            env::var("TARGET_PROCESS").unwrap_or_else(|_| DEFAULT_TARGET_PROCESS.into());

        let poll_interval = positive_secs(
            env::var("POLL_INTERVAL_SECS").ok().as_deref(),
            DEFAULT_POLL_INTERVAL_SECS,
        );
        let liveness_interval = positive_secs(
            env::var("LIVENESS_INTERVAL_SECS").ok().as_deref(),
            DEFAULT_LIVENESS_INTERVAL_SECS,
        );
        let cycle_timeout = positive_secs(
            env::var("CYCLE_TIMEOUT_SECS").ok().as_deref(),
            DEFAULT_CYCLE_TIMEOUT_SECS,
        );

        let request_max_retries = parse_or("REQUEST_MAX_RETRIES", DEFAULT_REQUEST_MAX_RETRIES);

        let api_rate_limit_per_second = env::var("API_RATE_LIMIT_PER_SECOND")
            .ok()
            .and_then(|v| v.parse().ok())
            .and_then(NonZeroU32::new)
            .unwrap_or_else(|| {
                NonZeroU32::new(DEFAULT_API_RATE_LIMIT_PER_SECOND).unwrap_or(NonZeroU32::MIN)
            });

        let diagnostic_log_path = env::var("DIAGNOSTIC_LOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data.log"));
        let diagnostic_log_max_lines =
            parse_or("DIAGNOSTIC_LOG_MAX_LINES", DEFAULT_DIAGNOSTIC_LOG_MAX_LINES);

        let name_refresh_limit = parse_or("NAME_REFRESH_LIMIT", DEFAULT_NAME_REFRESH_LIMIT);

        Ok(Self {
            database_url,
            api_base_url,
            tracked_account_id,
            target_process,
            poll_interval,
            liveness_interval,
            cycle_timeout,
            request_max_retries,
            api_rate_limit_per_second,
            diagnostic_log_path,
            diagnostic_log_max_lines,
            name_refresh_limit,
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Whole seconds from `raw`; missing, unparsable or zero values use `default`.
fn positive_secs(raw: Option<&str>, default: u64) -> Duration {
    let secs = raw
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(default);
    Duration::from_secs(secs)
}

/// Overlay preferences persisted in the `settings` table.
///
/// Missing or unreadable rows fall back to the documented defaults below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Key combination toggling the overlay while the game runs. Default `ctrl+q`.
    pub hotkey: String,
    /// Show the overlay as soon as the application starts. Default off.
    pub show_overlay_on_start: bool,
    /// Show the input-rate panel. Default off.
    pub show_input_rate: bool,
    /// Allow moving overlay windows by dragging. Default off.
    pub allow_dragging: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hotkey: "ctrl+q".into(),
            show_overlay_on_start: false,
            show_input_rate: false,
            allow_dragging: false,
        }
    }
}

impl Settings {
    pub const HOTKEY: &'static str = "hotkey";
    pub const SHOW_OVERLAY_ON_START: &'static str = "show_gui_when_start";
    pub const SHOW_INPUT_RATE: &'static str = "show_apm";
    pub const ALLOW_DRAGGING: &'static str = "able_dragging";

    /// Builds settings from raw `(key, value)` rows, ignoring unknown keys and
    /// keeping the default for any value that does not parse.
    pub fn from_rows<I, K, V>(rows: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut settings = Self::default();

        for (key, value) in rows {
            let value = value.as_ref().trim();
            match key.as_ref() {
                Self::HOTKEY if !value.is_empty() => settings.hotkey = value.to_string(),
                Self::SHOW_OVERLAY_ON_START => {
                    settings.show_overlay_on_start =
                        parse_flag(value).unwrap_or(settings.show_overlay_on_start)
                }
                Self::SHOW_INPUT_RATE => {
                    settings.show_input_rate = parse_flag(value).unwrap_or(settings.show_input_rate)
                }
                Self::ALLOW_DRAGGING => {
                    settings.allow_dragging = parse_flag(value).unwrap_or(settings.allow_dragging)
                }
                _ => {}
            }
        }

        settings
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_or_invalid_intervals_fall_back() {
        assert_eq!(positive_secs(Some("0"), 10), Duration::from_secs(10));
        assert_eq!(positive_secs(Some("soon"), 5), Duration::from_secs(5));
        assert_eq!(positive_secs(None, 80), Duration::from_secs(80));
        assert_eq!(positive_secs(Some(" 3 "), 10), Duration::from_secs(3));
    }

    #[test]
    fn settings_default_when_no_rows() {
        let settings = Settings::from_rows(Vec::<(String, String)>::new());
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.hotkey, "ctrl+q");
    }

    #[test]
    fn settings_apply_known_rows() {
        let settings = Settings::from_rows([
            ("hotkey", "alt+m"),
            ("show_gui_when_start", "1"),
            ("show_apm", "0"),
            ("able_dragging", "true"),
            ("window_theme", "dark"),
        ]);

        assert_eq!(settings.hotkey, "alt+m");
        assert!(settings.show_overlay_on_start);
        assert!(!settings.show_input_rate);
        assert!(settings.allow_dragging);
    }

    #[test]
    fn settings_keep_default_on_garbage() {
        let settings = Settings::from_rows([("show_apm", "maybe"), ("hotkey", "  ")]);
        assert_eq!(settings, Settings::default());
    }
}
