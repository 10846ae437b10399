use serde_json::{json, Value};

use crate::models::TidyRow;

pub const INVOICE_NUMBER_PROPERTY: &str = "Invoice Number";

const RECORD_DATE_FORMAT: &str = "%Y-%m-%d";

/// Body of a page-creation request for one tidy row.
///
/// `YM` is the title property; `Category` is created empty for manual tagging.
pub fn page_payload(database_id: &str, row: &TidyRow) -> Value {
    let mut payload = json!({
        "parent": { "database_id": database_id },
        "properties": {
            "YM": { "title": rich_text(&row.year_month().to_string()) },
            "Date": {
                "date": {
                    "start": row.invoice_date.format(RECORD_DATE_FORMAT).to_string(),
                    "end": null,
                    "time_zone": null
                }
            },
            "Shop": { "rich_text": rich_text(&row.seller_name) },
            "Description": { "rich_text": rich_text(&row.description) },
            "Category": { "select": null },
            "Amount": { "number": row.rounded_amount() }
        }
    });

    payload["properties"][INVOICE_NUMBER_PROPERTY] = json!({ "rich_text": rich_text(&row.invoice_number) });

    payload
}

/// Plain text of the first rich-text fragment of the invoice-number property, if any.
pub fn invoice_number_of(page: &Value) -> Option<&str> {
    page.get("properties")?
        .get(INVOICE_NUMBER_PROPERTY)?
        .get("rich_text")?
        .get(0)?
        .get("plain_text")?
        .as_str()
}

fn rich_text(content: &str) -> Value {
    json!([{ "type": "text", "text": { "content": content } }])
}
