use std::collections::HashMap;
use std::env;
use std::fs;

use crate::error::BotError;

pub const DEFAULT_RUN_MODE: &str = "cli";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MODEL: &str = "gpt-5";
pub const DEFAULT_CAL_BASE_URL: &str = "https://api.cal.com/v2";
pub const DEFAULT_EVENT_TYPE_ID: u64 = 3666489;

#[derive(Debug, Default, Clone)]
pub struct AppConfig {
    values: HashMap<String, String>,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self, String> {
        let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
        let mut values = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(format!("Invalid config line {}: {}", idx + 1, line));
            };
            let key = key.trim();
            let mut value = value.trim().to_string();
            if (value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\''))
            {
                value = value[1..value.len() - 1].to_string();
            }
            values.insert(key.to_string(), value);
        }
        Ok(Self { values })
    }

    // Config file first, process environment second.
    pub fn get(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .cloned()
            .or_else(|| env::var(key).ok())
    }
}

// Everything the process needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub run_mode: String,
    pub port: u16,
    pub openai_api_key: String,
    pub openai_model: String,
    pub cal_api_key: String,
    pub cal_base_url: String,
    pub event_type_id: u64,
}

impl Settings {
    pub fn resolve(config: &AppConfig) -> Result<Self, BotError> {
        let openai_api_key = config
            .get("OPENAI_API_KEY")
            .ok_or(BotError::MissingCredential("OPENAI_API_KEY"))?;
        let cal_api_key = config
            .get("CAL_API_KEY")
            .ok_or(BotError::MissingCredential("CAL_API_KEY"))?;

        Ok(Settings {
            run_mode: config
                .get("RUN_MODE")
                .unwrap_or_else(|| DEFAULT_RUN_MODE.to_string()),
            port: config
                .get("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            openai_api_key,
            openai_model: config
                .get("OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            cal_api_key,
            cal_base_url: config
                .get("CAL_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_CAL_BASE_URL.to_string()),
            event_type_id: config
                .get("CAL_EVENT_TYPE_ID")
                .and_then(|id| id.parse().ok())
                .unwrap_or(DEFAULT_EVENT_TYPE_ID),
        })
    }
}
