use std::{collections::HashMap, fs, path::PathBuf, sync::Arc};

use anyhow::Context;
use server_api::SheetsBackend;
use sheets_integration::{
    connect, google::DEFAULT_API_BASE, MemorySheetStore, SecretsFile, ServiceAccountKey,
    SheetTarget,
};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Google,
    Memory,
}

impl BackendKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "google" | "sheets" => Some(Self::Google),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Settings {
    pub server_bind: String,
    pub secrets_path: PathBuf,
    pub spreadsheet_id: Option<String>,
    pub worksheet_name: Option<String>,
    pub credentials: Option<ServiceAccountKey>,
    pub sheets_api_base: String,
    pub sheets_backend: BackendKind,
    pub session_ttl_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8501".into(),
            secrets_path: PathBuf::from("secrets.toml"),
            spreadsheet_id: None,
            worksheet_name: None,
            credentials: None,
            sheets_api_base: DEFAULT_API_BASE.into(),
            sheets_backend: BackendKind::Google,
            session_ttl_seconds: 3600,
        }
    }
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let server_toml = fs::read_to_string("server.toml").ok();
    load_settings_from(server_toml.as_deref(), |name| std::env::var(name).ok())
}

/// Defaults, then `server.toml`, then the secrets file, then the environment.
pub fn load_settings_from(
    server_toml: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Some(raw) = server_toml {
        let file_cfg = toml::from_str::<HashMap<String, toml::Value>>(raw)
            .context("invalid server.toml")?;
        let text = |key: &str| {
            file_cfg
                .get(key)
                .and_then(|value| value.as_str())
                .map(str::to_string)
        };
        if let Some(v) = text("bind_addr") {
            settings.server_bind = v;
        }
        if let Some(v) = text("secrets_path") {
            settings.secrets_path = PathBuf::from(v);
        }
        if let Some(v) = text("worksheet_name") {
            settings.worksheet_name = Some(v);
        }
        if let Some(v) = text("sheets_api_base") {
            settings.sheets_api_base = v;
        }
        if let Some(v) = text("sheets_backend").as_deref().and_then(BackendKind::parse) {
            settings.sheets_backend = v;
        }
        if let Some(v) = file_cfg
            .get("session_ttl_seconds")
            .and_then(|value| value.as_integer())
            .and_then(|value| u64::try_from(value).ok())
        {
            settings.session_ttl_seconds = v;
        }
    }

    if let Some(v) = env_override(&env, &["APP__SECRETS_PATH"]) {
        settings.secrets_path = PathBuf::from(v);
    }

    if settings.secrets_path.exists() {
        let secrets = SecretsFile::load(&settings.secrets_path)?;
        if secrets.spreadsheet_id.is_some() {
            settings.spreadsheet_id = secrets.spreadsheet_id;
        }
        if secrets.worksheet_name.is_some() {
            settings.worksheet_name = secrets.worksheet_name;
        }
        if secrets.gcp_service_account.is_some() {
            settings.credentials = secrets.gcp_service_account;
        }
    }

    if let Some(v) = env_override(&env, &["SERVER_BIND", "APP__BIND_ADDR"]) {
        settings.server_bind = v;
    }
    if let Some(v) = env_override(&env, &["SPREADSHEET_ID", "APP__SPREADSHEET_ID"]) {
        settings.spreadsheet_id = Some(v);
    }
    if let Some(v) = env_override(&env, &["WORKSHEET_NAME", "APP__WORKSHEET_NAME"]) {
        settings.worksheet_name = Some(v);
    }
    if let Some(path) = env_override(&env, &["GOOGLE_APPLICATION_CREDENTIALS"]) {
        settings.credentials = Some(ServiceAccountKey::from_json_file(path)?);
    }
    if let Some(v) = env_override(&env, &["APP__SHEETS_API_BASE"]) {
        settings.sheets_api_base = v;
    }
    if let Some(v) =
        env_override(&env, &["APP__SHEETS_BACKEND"]).and_then(|v| BackendKind::parse(&v))
    {
        settings.sheets_backend = v;
    }
    if let Some(v) =
        env_override(&env, &["APP__SESSION_TTL_SECONDS"]).and_then(|v| v.parse().ok())
    {
        settings.session_ttl_seconds = v;
    }

    Ok(settings)
}

/// Later names win, so `APP__*` overrides the bare variable.
fn env_override(env: &impl Fn(&str) -> Option<String>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|&name| env(name))
        .filter(|value| !value.trim().is_empty())
        .last()
}

/// Builds the submission backend. Missing sheet configuration is not fatal:
/// the server starts and every submission reports the gap.
pub fn sheets_backend(settings: &Settings) -> anyhow::Result<SheetsBackend> {
    if settings.sheets_backend == BackendKind::Memory {
        warn!("using in-memory sheet backend, submissions are not persisted");
        return Ok(SheetsBackend::Ready(Arc::new(MemorySheetStore::new())));
    }

    let target = match SheetTarget::resolve(
        settings.spreadsheet_id.clone(),
        settings.worksheet_name.clone(),
        settings.credentials.clone(),
    ) {
        Ok(target) => target,
        Err(gap) => {
            warn!(%gap, secrets_path = %settings.secrets_path.display(), "sheet is not configured");
            return Ok(SheetsBackend::Missing(gap));
        }
    };

    let store = connect(&target, &settings.sheets_api_base)
        .context("failed to set up the Google Sheets client")?;
    info!(
        spreadsheet_id = %target.spreadsheet_id,
        worksheet = %target.worksheet_name,
        client_email = %target.credentials.client_email,
        "sheet backend ready"
    );
    Ok(SheetsBackend::Ready(Arc::new(store)))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
