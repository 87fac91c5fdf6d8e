use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use tracing::info;
use url::Url;

use crate::{auth::AccessTokenProvider, error::SheetsError, SheetStore};

pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com/v4/";
pub const NEW_WORKSHEET_ROWS: u32 = 2000;
pub const NEW_WORKSHEET_COLUMNS: u32 = 80;

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// One worksheet of a spreadsheet, reached through the Sheets v4 REST API.
pub struct GoogleSheetsStore {
    http: Client,
    auth: Arc<dyn AccessTokenProvider>,
    api_base: Url,
    spreadsheet_id: String,
    worksheet: String,
}

impl GoogleSheetsStore {
    pub fn new(
        http: Client,
        auth: Arc<dyn AccessTokenProvider>,
        api_base: &str,
        spreadsheet_id: impl Into<String>,
        worksheet: impl Into<String>,
    ) -> Result<Self, SheetsError> {
        let mut api_base = Url::parse(api_base)?;
        if !api_base.path().ends_with('/') {
            let path = format!("{}/", api_base.path());
            api_base.set_path(&path);
        }
        Ok(Self {
            http,
            auth,
            api_base,
            spreadsheet_id: spreadsheet_id.into(),
            worksheet: worksheet.into(),
        })
    }

    pub fn worksheet(&self) -> &str {
        &self.worksheet
    }

    fn spreadsheet_url(&self, suffix: Option<&str>) -> Result<Url, SheetsError> {
        let mut url = self.api_base.join("spreadsheets")?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?;
            match suffix {
                Some(suffix) => segments.push(&format!("{}{suffix}", self.spreadsheet_id)),
                None => segments.push(&self.spreadsheet_id),
            };
        }
        Ok(url)
    }

    fn values_url(&self, range: &str, action: Option<&str>) -> Result<Url, SheetsError> {
        let mut url = self.spreadsheet_url(None)?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?;
            segments.push("values");
            match action {
                Some(action) => segments.push(&format!("{range}:{action}")),
                None => segments.push(range),
            };
        }
        Ok(url)
    }

    /// A1 range of the whole worksheet, quoted so any title is accepted.
    fn sheet_range(&self, cells: &str) -> String {
        let quoted = format!("'{}'", self.worksheet.replace('\'', "''"));
        if cells.is_empty() {
            quoted
        } else {
            format!("{quoted}!{cells}")
        }
    }

    async fn send(
        &self,
        method: &'static str,
        url: &Url,
        request: RequestBuilder,
    ) -> Result<Response, SheetsError> {
        let token = self.auth.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|source| SheetsError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::Api {
                method,
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(url: &Url, response: Response) -> Result<T, SheetsError> {
        response.json().await.map_err(|err| SheetsError::Decode {
            url: url.to_string(),
            reason: err.to_string(),
        })
    }

    async fn worksheet_titles(&self) -> Result<Vec<String>, SheetsError> {
        let mut url = self.spreadsheet_url(None)?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");
        let response = self.send("GET", &url, self.http.get(url.clone())).await?;
        let metadata: SpreadsheetMetadata = Self::decode(&url, response).await?;
        Ok(metadata
            .sheets
            .into_iter()
            .map(|sheet| sheet.properties.title)
            .collect())
    }
}

#[async_trait]
impl SheetStore for GoogleSheetsStore {
    async fn ensure_worksheet(&self) -> Result<(), SheetsError> {
        if self
            .worksheet_titles()
            .await?
            .iter()
            .any(|title| *title == self.worksheet)
        {
            return Ok(());
        }

        let url = self.spreadsheet_url(Some(":batchUpdate"))?;
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": self.worksheet,
                        "gridProperties": {
                            "rowCount": NEW_WORKSHEET_ROWS,
                            "columnCount": NEW_WORKSHEET_COLUMNS,
                        }
                    }
                }
            }]
        });
        self.send("POST", &url, self.http.post(url.clone()).json(&body))
            .await?;
        info!(worksheet = %self.worksheet, "worksheet created");
        Ok(())
    }

    async fn first_row(&self) -> Result<Vec<String>, SheetsError> {
        let url = self.values_url(&self.sheet_range("1:1"), None)?;
        let response = self.send("GET", &url, self.http.get(url.clone())).await?;
        let range: ValueRange = Self::decode(&url, response).await?;
        Ok(range
            .values
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|cell| match cell {
                serde_json::Value::String(text) => text,
                other => other.to_string(),
            })
            .collect())
    }

    async fn append_row(&self, row: &[String]) -> Result<(), SheetsError> {
        let mut url = self.values_url(&self.sheet_range(""), Some("append"))?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        let body = json!({ "values": [row] });
        self.send("POST", &url, self.http.post(url.clone()).json(&body))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/google_tests.rs"]
mod tests;
