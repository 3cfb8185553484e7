use std::{collections::HashMap, fs};

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub bind_addr: String,
    pub seed_demo_data: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".into(),
            seed_demo_data: true,
        }
    }
}

/// Defaults, then `dev_backend.toml`, then `APP__*` environment variables.
pub fn load_settings() -> Settings {
    let file = fs::read_to_string("dev_backend.toml").ok();
    let env: HashMap<String, String> = std::env::vars().collect();
    resolve_settings(file.as_deref(), &env)
}

pub(crate) fn resolve_settings(file: Option<&str>, env: &HashMap<String, String>) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) {
            if let Some(v) = file_cfg.get("bind_addr").and_then(toml::Value::as_str) {
                settings.bind_addr = v.to_string();
            }
            if let Some(v) = file_cfg.get("seed_demo_data").and_then(toml::Value::as_bool) {
                settings.seed_demo_data = v;
            }
        }
    }

    if let Some(v) = env.get("APP__BIND_ADDR") {
        settings.bind_addr = v.clone();
    }
    if let Some(v) = env.get("APP__SEED_DEMO_DATA") {
        if let Ok(parsed) = v.parse::<bool>() {
            settings.seed_demo_data = parsed;
        }
    }

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
