use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_json::Value;

/// SQLite file used when neither flag, env, nor config names one.
pub const DEFAULT_DB_URL: &str = "sqlite://levellog.db";

/// Typed view of the settings the workspace reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelSettings {
    /// `db.url`; `None` leaves the choice to env / default.
    pub db_url: Option<String>,
    /// `survey.record_silent_readings`: keep readings with no sight in the
    /// history so later readings reduce against them.
    pub record_silent_readings: bool,
    /// `survey.require_benchmark`: refuse a first reading without a
    /// non-zero reduced level.
    pub require_benchmark: bool,
    /// `output.json`: machine-readable CLI output by default.
    pub json_output: bool,
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            db_url: None,
            record_silent_readings: true,
            require_benchmark: false,
            json_output: false,
        }
    }
}

impl LevelSettings {
    /// Build from canonical config JSON (produced by `load_layered_yaml*`).
    ///
    /// Every key is optional. Booleans accept `true`/`false` or the strings
    /// `"true"`/`"false"`; anything else is an error naming the key.
    pub fn from_config_json(cfg: &Value) -> Result<Self> {
        let defaults = Self::default();

        let db_url = match cfg.pointer("/db/url") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(s.trim().to_string()),
            Some(other) => return Err(anyhow!("db.url must be a string (got {other})")),
        };

        Ok(Self {
            db_url,
            record_silent_readings: bool_at(
                cfg,
                "/survey/record_silent_readings",
                defaults.record_silent_readings,
            )?,
            require_benchmark: bool_at(cfg, "/survey/require_benchmark", defaults.require_benchmark)?,
            json_output: bool_at(cfg, "/output/json", defaults.json_output)?,
        })
    }
}

fn bool_at(cfg: &Value, pointer: &str, default: bool) -> Result<bool> {
    match cfg.pointer(pointer) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(anyhow!("{} must be a boolean (got \"{s}\")", dotted(pointer))),
        },
        Some(other) => Err(anyhow!("{} must be a boolean (got {other})", dotted(pointer))),
    }
}

fn dotted(pointer: &str) -> String {
    pointer.trim_start_matches('/').replace('/', ".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_config_yields_defaults() {
        let s = LevelSettings::from_config_json(&json!({})).unwrap();
        assert_eq!(s, LevelSettings::default());
        assert!(s.record_silent_readings);
        assert!(!s.require_benchmark);
    }

    #[test]
    fn reads_every_consumed_key() {
        let cfg = json!({
            "db": { "url": " sqlite://site-a.db " },
            "survey": { "record_silent_readings": false, "require_benchmark": "true" },
            "output": { "json": true }
        });
        let s = LevelSettings::from_config_json(&cfg).unwrap();
        assert_eq!(s.db_url.as_deref(), Some("sqlite://site-a.db"));
        assert!(!s.record_silent_readings);
        assert!(s.require_benchmark);
        assert!(s.json_output);
    }

    #[test]
    fn blank_db_url_is_unset() {
        let s = LevelSettings::from_config_json(&json!({ "db": { "url": "  " } })).unwrap();
        assert_eq!(s.db_url, None);
    }

    #[test]
    fn non_boolean_flag_names_the_key() {
        let err = LevelSettings::from_config_json(&json!({
            "survey": { "require_benchmark": 3 }
        }))
        .unwrap_err();
        assert!(
            err.to_string().contains("survey.require_benchmark"),
            "got: {err}"
        );
    }
}
