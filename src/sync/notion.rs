use std::collections::HashSet;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::{SyncConfig, NOTION_VERSION};
use crate::models::TidyRow;
use crate::sync::properties::{invoice_number_of, page_payload};
use crate::sync::{RecordStore, SyncError};
use crate::types::InvoiceNumber;

const VERSION_HEADER: &str = "notion-version";
const PAGES_PATH: &str = "/v1/pages";

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_cursor: Option<&'a str>
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>
}

/// Notion database accessed over its REST API (blocking, one request at a time).
pub struct NotionStore {
    http: Client,
    config: SyncConfig
}

impl NotionStore {
    pub fn new(config: SyncConfig) -> Result<Self, SyncError> {
        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", config.secret))?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(VERSION_HEADER, HeaderValue::from_static(NOTION_VERSION));

        let http = Client::builder()
            .user_agent(format!("invoice-tidy/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { http, config })
    }

    /// Sends a JSON POST and returns the body of a successful response.
    fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<String, SyncError> {
        let response = self.http
            .post(format!("{}{path}", self.config.api_base))
            .json(body)
            .send()?;

        let status = response.status();
        let text = response.text()?;

        if !status.is_success() {
            return Err(SyncError::Http {
                status: status.as_u16(),
                body: text
            })
        }

        Ok(text)
    }

    fn query_page(&self, start_cursor: Option<&str>) -> Result<QueryResponse, SyncError> {
        let path = format!("/v1/databases/{}/query", self.config.database_id);
        let request = QueryRequest {
            page_size: self.config.page_size,
            start_cursor
        };

        let body = self.post(&path, &request)?;

        Ok(serde_json::from_str(&body)?)
    }
}

impl RecordStore for NotionStore {
    /// Walks every page of the database query until the cursor runs out.
    fn existing_invoice_numbers(&self) -> Result<HashSet<InvoiceNumber>, SyncError> {
        let mut invoice_numbers = HashSet::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0;

        loop {
            let response = self.query_page(cursor.as_deref())?;
            pages += 1;

            invoice_numbers.extend(response.results.iter().filter_map(invoice_number_of).map(str::to_string));

            if !response.has_more {
                break;
            }

            cursor = Some(response.next_cursor.ok_or(SyncError::MissingCursor)?);
        }

        debug!("Read {} invoice numbers from {} query pages", invoice_numbers.len(), pages);

        Ok(invoice_numbers)
    }

    fn create_record(&self, row: &TidyRow) -> Result<(), SyncError> {
        self.post(PAGES_PATH, &page_payload(&self.config.database_id, row))
            .map(|_| ())
    }
}
