use std::{collections::HashMap, fs};

/// Where the two backend services and the local preferences database
/// live. The contract URL carries the full service prefix, matching
/// the reverse-proxy rewrite the deployed client sits behind.
#[derive(Debug, Clone)]
pub struct Settings {
    pub user_service_url: String,
    pub contract_service_url: String,
    pub prefs_db: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_service_url: "http://127.0.0.1:8080".into(),
            contract_service_url: "http://127.0.0.1:8081/api/contracts".into(),
            prefs_db: "./data/client.sqlite3".into(),
        }
    }
}

/// Defaults, overridden by `client.toml` in the working directory,
/// overridden by environment variables.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("client.toml") {
        apply_file_overrides(&mut settings, &raw);
    }

    if let Ok(v) = std::env::var("CRA_USER_SERVICE_URL") {
        settings.user_service_url = v;
    }
    if let Ok(v) = std::env::var("CRA_CONTRACT_SERVICE_URL") {
        settings.contract_service_url = v;
    }
    if let Ok(v) = std::env::var("CRA_PREFS_DB") {
        settings.prefs_db = v;
    }

    settings
}

fn apply_file_overrides(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
        return;
    };
    if let Some(v) = file_cfg.get("user_service_url") {
        settings.user_service_url = v.clone();
    }
    if let Some(v) = file_cfg.get("contract_service_url") {
        settings.contract_service_url = v.clone();
    }
    if let Some(v) = file_cfg.get("prefs_db") {
        settings.prefs_db = v.clone();
    }
}
