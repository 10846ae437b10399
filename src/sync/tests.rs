use super::properties::{invoice_number_of, page_payload};
use super::{NotionStore, RecordStore, SyncError, SyncReport, Syncer};

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use httpmock::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::HashSet;
use std::time::Duration;

use crate::config::SyncConfig;
use crate::models::TidyRow;

const SECRET: &str = "secret_test";
const DATABASE_ID: &str = "db-1";

fn tidy_row(invoice_number: &str, amount: Decimal, description: &str) -> Result<TidyRow> {
    Ok(TidyRow {
        invoice_number: invoice_number.to_string(),
        invoice_date: NaiveDate::from_ymd_opt(2023, 2, 3).ok_or_else(|| anyhow!("invalid test date"))?,
        seller_name: "全家便利商店".to_string(),
        amount,
        description: description.to_string()
    })
}

fn existing_page(invoice_number: &str) -> Value {
    json!({
        "object": "page",
        "id": format!("page-{invoice_number}"),
        "properties": {
            "Invoice Number": {
                "type": "rich_text",
                "rich_text": [{ "type": "text", "plain_text": invoice_number }]
            }
        }
    })
}

fn store_for(server: &MockServer) -> Result<NotionStore> {
    let config = SyncConfig::new(SECRET, DATABASE_ID)
        .with_api_base(server.base_url())
        .with_page_size(2)
        .with_timeout(Duration::from_secs(5));

    Ok(NotionStore::new(config)?)
}

#[derive(Default)]
struct MemoryStore {
    existing: HashSet<String>,
    rejected: HashSet<String>,
    unavailable: bool,
    created: RefCell<Vec<String>>
}

impl RecordStore for MemoryStore {
    fn existing_invoice_numbers(&self) -> Result<HashSet<String>, SyncError> {
        if self.unavailable {
            return Err(SyncError::Http { status: 503, body: "unavailable".to_string() })
        }

        Ok(self.existing.clone())
    }

    fn create_record(&self, row: &TidyRow) -> Result<(), SyncError> {
        if self.rejected.contains(&row.invoice_number) {
            return Err(SyncError::Http { status: 400, body: "validation_error".to_string() })
        }

        self.created.borrow_mut().push(row.invoice_number.clone());

        Ok(())
    }
}

#[test]
fn test_syncer_only_submits_invoices_missing_remotely() -> Result<()> {
    let store = MemoryStore {
        existing: HashSet::from(["BG1".to_string()]),
        ..MemoryStore::default()
    };
    let rows = vec![
        tidy_row("BG1", dec!(70), "Latte")?,
        tidy_row("BG2", dec!(100), "Bento")?,
        tidy_row("BG2", dec!(50), "Juice")?
    ];

    let report = Syncer::new(&store).sync(&rows)?;

    assert_eq!(report, SyncReport { success: 2, fail: 0, skipped: 1 });
    assert_eq!(*store.created.borrow(), vec!["BG2".to_string(), "BG2".to_string()]);

    Ok(())
}

#[test]
fn test_syncer_counts_failures_and_keeps_going() -> Result<()> {
    let store = MemoryStore {
        rejected: HashSet::from(["BG1".to_string()]),
        ..MemoryStore::default()
    };
    let rows = vec![
        tidy_row("BG1", dec!(70), "Latte")?,
        tidy_row("BG2", dec!(100), "Bento")?
    ];

    let report = Syncer::new(&store).sync(&rows)?;

    assert_eq!(report, SyncReport { success: 1, fail: 1, skipped: 0 });
    assert_eq!(*store.created.borrow(), vec!["BG2".to_string()]);

    Ok(())
}

#[test]
fn test_syncer_creates_nothing_when_listing_fails() -> Result<()> {
    let store = MemoryStore {
        unavailable: true,
        ..MemoryStore::default()
    };

    let result = Syncer::new(&store).sync(&[tidy_row("BG1", dec!(70), "Latte")?]);

    assert!(matches!(result, Err(SyncError::Http { status: 503, .. })));
    assert!(store.created.borrow().is_empty());

    Ok(())
}

#[test]
fn test_config_requires_both_credentials() {
    assert!(matches!(
        SyncConfig::from_credentials(None, Some(DATABASE_ID.to_string())),
        Err(SyncError::MissingConfig("NOTION_SECRET"))
    ));
    assert!(matches!(
        SyncConfig::from_credentials(Some(SECRET.to_string()), Some("   ".to_string())),
        Err(SyncError::MissingConfig("DATABASE_ID"))
    ));
}

#[test]
fn test_config_defaults_and_overrides() -> Result<()> {
    let config = SyncConfig::from_credentials(Some(format!(" {SECRET} ")), Some(DATABASE_ID.to_string()))?;

    assert_eq!(config.secret, SECRET);
    assert_eq!(config.api_base, "https://api.notion.com");
    assert_eq!(config.page_size, 100);
    assert_eq!(config.timeout, Duration::from_secs(30));

    let config = config.with_api_base("http://localhost:9000/");
    assert_eq!(config.api_base, "http://localhost:9000");

    Ok(())
}

#[test]
fn test_page_payload_maps_row_to_properties() -> Result<()> {
    let payload = page_payload(DATABASE_ID, &tidy_row("BG2", dec!(69.5), "Latte *** Discount")?);

    assert_eq!(payload["parent"]["database_id"], DATABASE_ID);
    assert_eq!(payload["properties"]["YM"]["title"][0]["text"]["content"], "2023/02");
    assert_eq!(payload["properties"]["Date"]["date"]["start"], "2023-02-03");
    assert_eq!(payload["properties"]["Shop"]["rich_text"][0]["text"]["content"], "全家便利商店");
    assert_eq!(payload["properties"]["Description"]["rich_text"][0]["text"]["content"], "Latte *** Discount");
    assert_eq!(payload["properties"]["Amount"]["number"], 70);
    assert_eq!(payload["properties"]["Invoice Number"]["rich_text"][0]["text"]["content"], "BG2");
    assert!(payload["properties"]["Category"]["select"].is_null());

    Ok(())
}

#[test]
fn test_invoice_number_is_read_from_first_rich_text_fragment() {
    assert_eq!(invoice_number_of(&existing_page("BG1")), Some("BG1"));

    let empty = json!({ "properties": { "Invoice Number": { "rich_text": [] } } });
    assert_eq!(invoice_number_of(&empty), None);
    assert_eq!(invoice_number_of(&json!({ "properties": {} })), None);
}

#[test]
fn test_notion_store_follows_query_cursor_until_exhausted() -> Result<()> {
    let server = MockServer::start();

    let first_page = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/databases/db-1/query")
            .header("authorization", "Bearer secret_test")
            .header("notion-version", "2022-06-28")
            .json_body(json!({ "page_size": 2 }));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "object": "list",
                "results": [existing_page("BG1"), existing_page("BG2")],
                "has_more": true,
                "next_cursor": "cursor-2"
            }));
    });

    let second_page = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/databases/db-1/query")
            .json_body(json!({ "page_size": 2, "start_cursor": "cursor-2" }));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "object": "list",
                "results": [existing_page("BG3"), { "properties": { "Invoice Number": { "rich_text": [] } } }],
                "has_more": false,
                "next_cursor": null
            }));
    });

    let numbers = store_for(&server)?.existing_invoice_numbers()?;

    first_page.assert();
    second_page.assert();
    assert_eq!(numbers, HashSet::from(["BG1".to_string(), "BG2".to_string(), "BG3".to_string()]));

    Ok(())
}

#[test]
fn test_notion_store_rejects_more_pages_without_cursor() -> Result<()> {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST)
            .path("/v1/databases/db-1/query");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "results": [], "has_more": true, "next_cursor": null }));
    });

    let result = store_for(&server)?.existing_invoice_numbers();

    assert!(matches!(result, Err(SyncError::MissingCursor)));

    Ok(())
}

#[test]
fn test_notion_store_surfaces_http_failure_body() -> Result<()> {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST)
            .path("/v1/pages");
        then.status(400)
            .header("content-type", "application/json")
            .body(r#"{"object":"error","code":"validation_error"}"#);
    });

    let error = store_for(&server)?.create_record(&tidy_row("BG2", dec!(100), "Bento")?).unwrap_err();

    assert!(matches!(error, SyncError::Http { status: 400, ref body } if body.contains("validation_error")));

    Ok(())
}

#[test]
fn test_sync_against_notion_submits_only_new_invoices() -> Result<()> {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST)
            .path("/v1/databases/db-1/query");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "results": [existing_page("BG1")], "has_more": false, "next_cursor": null }));
    });

    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/pages")
            .header("notion-version", "2022-06-28");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "object": "page", "id": "page-new" }));
    });

    let rows = vec![
        tidy_row("BG1", dec!(70), "Latte")?,
        tidy_row("BG2", dec!(100), "Bento")?
    ];

    let report = Syncer::new(store_for(&server)?).sync(&rows)?;

    create.assert_calls(1);
    assert_eq!(report, SyncReport { success: 1, fail: 0, skipped: 1 });

    Ok(())
}

#[test]
fn test_sync_against_notion_counts_rejected_creates() -> Result<()> {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST)
            .path("/v1/databases/db-1/query");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "results": [], "has_more": false, "next_cursor": null }));
    });

    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/pages");
        then.status(500)
            .body("internal error");
    });

    let rows = vec![
        tidy_row("BG1", dec!(70), "Latte")?,
        tidy_row("BG2", dec!(100), "Bento")?
    ];

    let report = Syncer::new(store_for(&server)?).sync(&rows)?;

    create.assert_calls(2);
    assert_eq!(report, SyncReport { success: 0, fail: 2, skipped: 0 });

    Ok(())
}
