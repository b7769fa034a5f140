use crate::infrastructure::error::CoreError;
use chrono::NaiveTime;
use chrono_tz::Tz;
use std::fs;
use std::path::Path;
use std::str::FromStr;

const APP_JSON: &str = "app.json";
const DEFAULT_CALENDAR_ID: &str = "primary";

fn default_config() -> serde_json::Value {
    serde_json::json!({
        "schema": 1,
        "appName": "FocusMate",
        "timezone": "UTC",
        "calendarId": DEFAULT_CALENDAR_ID,
        "workHours": {
            "start": "09:00",
            "end": "18:00"
        }
    })
}

pub fn ensure_default_config(config_dir: &Path) -> Result<(), CoreError> {
    let path = config_dir.join(APP_JSON);
    if !path.exists() {
        let formatted = serde_json::to_string_pretty(&default_config())?;
        fs::write(path, format!("{formatted}\n"))?;
    }
    Ok(())
}

fn read_config(config_dir: &Path) -> Result<serde_json::Value, CoreError> {
    let path = config_dir.join(APP_JSON);
    let raw = fs::read_to_string(&path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| CoreError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != 1 {
        return Err(CoreError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

pub fn read_timezone(config_dir: &Path) -> Result<Option<Tz>, CoreError> {
    let app = read_config(config_dir)?;
    let Some(name) = app
        .get("timezone")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
    else {
        return Ok(None);
    };
    let tz = Tz::from_str(name)
        .map_err(|_| CoreError::InvalidConfig(format!("unknown timezone '{name}'")))?;
    Ok(Some(tz))
}

pub fn read_calendar_id(config_dir: &Path) -> Result<String, CoreError> {
    let app = read_config(config_dir)?;
    Ok(app
        .get("calendarId")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_CALENDAR_ID)
        .to_string())
}

pub fn read_work_hours(config_dir: &Path) -> Result<(NaiveTime, NaiveTime), CoreError> {
    let app = read_config(config_dir)?;
    let hours = app
        .get("workHours")
        .ok_or_else(|| CoreError::InvalidConfig("missing workHours".to_string()))?;

    let start = parse_hhmm_field(hours, "start")?;
    let end = parse_hhmm_field(hours, "end")?;
    if start >= end {
        return Err(CoreError::InvalidConfig(
            "workHours.start must be before workHours.end".to_string(),
        ));
    }
    Ok((start, end))
}

fn parse_hhmm_field(hours: &serde_json::Value, field: &str) -> Result<NaiveTime, CoreError> {
    let raw = hours
        .get(field)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| CoreError::InvalidConfig(format!("missing workHours.{field}")))?;
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map_err(|_| CoreError::InvalidConfig(format!("workHours.{field} must be HH:MM")))
}
