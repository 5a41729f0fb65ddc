//! Google Sheets v4 REST 클라이언트.
//!
//! 사용하는 엔드포인트:
//! - `GET  /v4/spreadsheets/{id}?fields=sheets(properties(sheetId,title))`
//! - `POST /v4/spreadsheets/{id}:batchUpdate`
//! - `GET  /v4/spreadsheets/{id}/values/{range}`
//! - `PUT  /v4/spreadsheets/{id}/values/{range}?valueInputOption=USER_ENTERED`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{A1Range, SheetRequest, SpreadsheetApi};
use crate::auth::AccessToken;
use crate::{Result, SheetsError};

/// 기본 API URL.
pub const DEFAULT_SHEETS_URL: &str = "https://sheets.googleapis.com";

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: Option<SheetProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// 단일 스프레드시트에 대한 REST 클라이언트.
pub struct GoogleSheetsClient {
    client: Client,
    base_url: String,
    spreadsheet_id: String,
    token: AccessToken,
}

impl GoogleSheetsClient {
    pub fn new(
        base_url: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        token: AccessToken,
    ) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            spreadsheet_id: spreadsheet_id.into(),
            token,
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// `{base}/v4/spreadsheets/{id}` 뒤에 세그먼트를 붙인 URL.
    fn url(&self, tail: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SheetsError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| SheetsError::InvalidUrl(self.base_url.clone()))?;
            segments.pop_if_empty().extend(["v4", "spreadsheets"]);
            match tail.split_first() {
                // ":batchUpdate" 같은 접미사는 ID 세그먼트에 붙음
                Some((first, rest)) if first.starts_with(':') => {
                    segments.push(&format!("{}{}", self.spreadsheet_id, first));
                    segments.extend(rest);
                }
                _ => {
                    segments.push(&self.spreadsheet_id);
                    segments.extend(tail);
                }
            }
        }
        Ok(url)
    }

    fn values_url(&self, range: &A1Range) -> Result<Url> {
        self.url(&["values", &range.to_string()])
    }

    /// 2xx가 아니면 `SheetsError::Api`.
    async fn check(operation: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(operation, %status, body = %body, "Sheets API call failed");
        Err(SheetsError::api(operation, status.as_u16()))
    }
}

#[async_trait]
impl SpreadsheetApi for GoogleSheetsClient {
    async fn sheet_id(&self, sheet_name: &str) -> Result<i64> {
        let mut url = self.url(&[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets(properties(sheetId,title))");

        let response = self
            .client
            .get(url)
            .bearer_auth(self.token.secret())
            .send()
            .await?;
        let meta: SpreadsheetMeta = Self::check("spreadsheets.get", response)
            .await?
            .json()
            .await
            .map_err(|e| SheetsError::Parse(format!("spreadsheet metadata: {}", e)))?;

        meta.sheets
            .into_iter()
            .filter_map(|entry| entry.properties)
            .find(|props| props.title == sheet_name)
            .map(|props| props.sheet_id)
            .ok_or_else(|| SheetsError::SheetNotFound(sheet_name.to_string()))
    }

    async fn batch_update(&self, requests: Vec<SheetRequest>) -> Result<()> {
        let url = self.url(&[":batchUpdate"])?;
        let response = self
            .client
            .post(url)
            .bearer_auth(self.token.secret())
            .json(&json!({ "requests": requests }))
            .send()
            .await?;
        Self::check("batchUpdate", response).await?;
        Ok(())
    }

    async fn read_range(&self, range: &A1Range) -> Result<Vec<Vec<Value>>> {
        let response = self
            .client
            .get(self.values_url(range)?)
            .bearer_auth(self.token.secret())
            .send()
            .await?;
        let values: ValueRange = Self::check("values.get", response)
            .await?
            .json()
            .await
            .map_err(|e| SheetsError::Parse(format!("value range: {}", e)))?;
        Ok(values.values)
    }

    async fn write_range(&self, range: &A1Range, rows: Vec<Vec<Value>>) -> Result<()> {
        let mut url = self.values_url(range)?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");

        let response = self
            .client
            .put(url)
            .bearer_auth(self.token.secret())
            .json(&json!({ "values": rows }))
            .send()
            .await?;
        Self::check("values.update", response).await?;
        Ok(())
    }
}
