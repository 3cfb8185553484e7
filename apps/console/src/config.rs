use std::{collections::HashMap, fs, path::Path};

use anyhow::Context;
use client_core::ClientSettings;

/// Defaults, then the TOML file (if present), then `APP__*` environment
/// variables.
pub fn load_settings(path: &Path) -> anyhow::Result<ClientSettings> {
    let file = match fs::read_to_string(path) {
        Ok(raw) => Some(raw),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()))
        }
    };
    let env: HashMap<String, String> = std::env::vars().collect();
    resolve_settings(file.as_deref(), &env)
        .with_context(|| format!("invalid settings in {}", path.display()))
}

pub(crate) fn resolve_settings(
    file: Option<&str>,
    env: &HashMap<String, String>,
) -> anyhow::Result<ClientSettings> {
    let mut settings = match file {
        Some(raw) => toml::from_str::<ClientSettings>(raw)?,
        None => ClientSettings::default(),
    };

    if let Some(v) = env.get("APP__API_BASE_URL") {
        settings.api_base_url = v.clone();
    }
    if let Some(v) = env.get("APP__AUTH_TOKEN") {
        settings.auth_token = Some(v.clone());
    }
    if let Some(v) = env.get("APP__REQUEST_TIMEOUT_MS") {
        settings.request_timeout_ms = v
            .parse()
            .with_context(|| format!("APP__REQUEST_TIMEOUT_MS is not a number: {v}"))?;
    }
    if let Some(v) = env.get("APP__SUCCESS_DELAY_MS") {
        settings.success_delay_ms = v
            .parse()
            .with_context(|| format!("APP__SUCCESS_DELAY_MS is not a number: {v}"))?;
    }

    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
