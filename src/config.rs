use crate::errors::ConfigError;
use crate::goals::GoalPolicy;
use crate::progress::ChecklistMatching;
use crate::storage::DEFAULT_DATA_PATH;
use chrono::NaiveTime;
use std::{env, path::PathBuf, str::FromStr};

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub sweep_at: NaiveTime,
    pub sweep_enabled: bool,
    pub checklist_matching: ChecklistMatching,
    pub goal_policy: GoalPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(value) => parse("PORT", &value)?,
            None => DEFAULT_PORT,
        };
        let data_path = lookup("APP_DATA_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));
        let sweep_at = match lookup("SWEEP_AT") {
            Some(value) => NaiveTime::parse_from_str(value.trim(), "%H:%M")
                .map_err(|err| invalid("SWEEP_AT", &value, err))?,
            None => default_sweep_time(),
        };
        let sweep_enabled = match lookup("SWEEP_ENABLED") {
            Some(value) => parse_flag("SWEEP_ENABLED", &value)?,
            None => true,
        };
        let checklist_matching = match lookup("CHECKLIST_MATCHING") {
            Some(value) => parse("CHECKLIST_MATCHING", &value)?,
            None => ChecklistMatching::default(),
        };
        let undated_window_days: u32 = match lookup("UNDATED_GOAL_WINDOW_DAYS") {
            Some(value) => parse("UNDATED_GOAL_WINDOW_DAYS", &value)?,
            None => GoalPolicy::default().undated_window_days,
        };
        if undated_window_days == 0 {
            return Err(invalid("UNDATED_GOAL_WINDOW_DAYS", "0", "must be at least 1"));
        }

        Ok(Self {
            port,
            data_path,
            sweep_at,
            sweep_enabled,
            checklist_matching,
            goal_policy: GoalPolicy { undated_window_days },
        })
    }
}

fn default_sweep_time() -> NaiveTime {
    NaiveTime::from_hms_opt(0, 1, 0).unwrap_or(NaiveTime::MIN)
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|err| invalid(key, value, err))
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value, "expected a boolean")),
    }
}

fn invalid(key: &'static str, value: &str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&'static str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<&'static str, String> =
            pairs.iter().map(|(k, v)| (*k, v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[("APP_DATA_PATH", "/tmp/tracker.json")]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_path, PathBuf::from("/tmp/tracker.json"));
        assert_eq!(config.sweep_at, NaiveTime::from_hms_opt(0, 1, 0).unwrap());
        assert!(config.sweep_enabled);
        assert_eq!(config.checklist_matching, ChecklistMatching::BookId);
        assert_eq!(config.goal_policy.undated_window_days, 1);
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("PORT", "9191"),
            ("SWEEP_AT", "03:30"),
            ("SWEEP_ENABLED", "off"),
            ("CHECKLIST_MATCHING", "position"),
            ("UNDATED_GOAL_WINDOW_DAYS", "14"),
        ])
        .unwrap();
        assert_eq!(config.port, 9191);
        assert_eq!(config.sweep_at, NaiveTime::from_hms_opt(3, 30, 0).unwrap());
        assert!(!config.sweep_enabled);
        assert_eq!(config.checklist_matching, ChecklistMatching::Position);
        assert_eq!(config.goal_policy.undated_window_days, 14);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[("PORT", "eighty")]).is_err());
        assert!(config(&[("SWEEP_AT", "25:00")]).is_err());
        assert!(config(&[("CHECKLIST_MATCHING", "title")]).is_err());
        assert!(config(&[("UNDATED_GOAL_WINDOW_DAYS", "0")]).is_err());
        assert!(config(&[("SWEEP_ENABLED", "maybe")]).is_err());
    }
}
