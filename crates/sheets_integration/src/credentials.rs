use std::{fmt, fs, path::Path};

use anyhow::Context;
use serde::Deserialize;

use crate::error::MissingConfig;

pub const DEFAULT_WORKSHEET_NAME: &str = "respostas";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Google service account key, as found in the downloaded JSON key file or in
/// the `[gcp_service_account]` table of the secrets file.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read service account key '{}'", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid service account key '{}'", path.display()))
    }
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Layout of the secrets file shared with the hosted deployment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecretsFile {
    #[serde(default, rename = "SPREADSHEET_ID", alias = "spreadsheet_id")]
    pub spreadsheet_id: Option<String>,
    #[serde(default, rename = "WORKSHEET_NAME", alias = "worksheet_name")]
    pub worksheet_name: Option<String>,
    #[serde(default)]
    pub gcp_service_account: Option<ServiceAccountKey>,
}

impl SecretsFile {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        toml::from_str(raw).context("invalid secrets file")
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read secrets file '{}'", path.display()))?;
        Self::parse(&raw)
    }
}

/// Where submissions go and who writes them.
#[derive(Debug, Clone)]
pub struct SheetTarget {
    pub spreadsheet_id: String,
    pub worksheet_name: String,
    pub credentials: ServiceAccountKey,
}

impl SheetTarget {
    /// Credentials are checked before the spreadsheet id. Blank values count
    /// as missing.
    pub fn resolve(
        spreadsheet_id: Option<String>,
        worksheet_name: Option<String>,
        credentials: Option<ServiceAccountKey>,
    ) -> Result<Self, MissingConfig> {
        let credentials = credentials.ok_or(MissingConfig::Credentials)?;
        let spreadsheet_id = spreadsheet_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or(MissingConfig::SpreadsheetId)?;
        let worksheet_name = worksheet_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_WORKSHEET_NAME.to_string());
        Ok(Self {
            spreadsheet_id,
            worksheet_name,
            credentials,
        })
    }
}

#[cfg(test)]
#[path = "tests/credentials_tests.rs"]
mod tests;
