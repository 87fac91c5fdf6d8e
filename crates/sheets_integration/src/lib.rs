use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use shared::{domain::header, record::SubmissionRecord};
use tracing::info;

pub mod auth;
pub mod credentials;
pub mod error;
pub mod google;
pub mod memory;

pub use auth::{AccessTokenProvider, ServiceAccountAuth, StaticToken};
pub use credentials::{SecretsFile, ServiceAccountKey, SheetTarget};
pub use error::{MissingConfig, SheetsError};
pub use google::GoogleSheetsStore;
pub use memory::MemorySheetStore;

/// Append-only access to one worksheet.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Creates the worksheet when the spreadsheet does not have it yet.
    async fn ensure_worksheet(&self) -> Result<(), SheetsError>;
    /// Cells of row 1; empty when the worksheet is empty.
    async fn first_row(&self) -> Result<Vec<String>, SheetsError>;
    async fn append_row(&self, row: &[String]) -> Result<(), SheetsError>;
}

/// Writes `header` as the first row unless the worksheet already has one.
///
/// An existing first row is left alone even when it differs from `header`.
pub async fn ensure_header(store: &dyn SheetStore, header: &[&str]) -> Result<bool, SheetsError> {
    if !store.first_row().await?.is_empty() {
        return Ok(false);
    }
    let row: Vec<String> = header.iter().map(|column| column.to_string()).collect();
    store.append_row(&row).await?;
    Ok(true)
}

pub async fn append_submission(
    store: &dyn SheetStore,
    record: &SubmissionRecord,
) -> Result<(), SheetsError> {
    let row = record.to_row()?;
    store.ensure_worksheet().await?;
    if ensure_header(store, &header()).await? {
        info!("header row written");
    }
    store.append_row(&row).await
}

/// Store for `target`, authenticated as its service account.
pub fn connect(target: &SheetTarget, api_base: &str) -> Result<GoogleSheetsStore, SheetsError> {
    let http = Client::new();
    let auth = ServiceAccountAuth::new(http.clone(), target.credentials.clone())?;
    GoogleSheetsStore::new(
        http,
        Arc::new(auth),
        api_base,
        target.spreadsheet_id.clone(),
        target.worksheet_name.clone(),
    )
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
