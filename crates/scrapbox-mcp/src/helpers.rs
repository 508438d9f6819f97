//! Argument parsing and result formatting.

use serde::Serialize;

use scrapbox_client::constants::PAGE_URL_BASE;

/// Lines of a multi-line argument, split on `\n` only.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split('\n').map(str::to_string).collect()
}

/// Body lines for a new page; an absent or empty body has none.
pub fn body_lines(body: Option<&str>) -> Vec<String> {
    match body {
        Some(text) if !text.is_empty() => split_lines(text),
        _ => Vec::new(),
    }
}

/// `Error: <field> is required` when `value` is empty.
pub fn require(field: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        Err(format!("Error: {field} is required"))
    } else {
        Ok(())
    }
}

/// Public URL of a page.
pub fn page_url(project: &str, title: &str) -> String {
    format!("{PAGE_URL_BASE}/{project}/{title}")
}

/// Pretty JSON for tool output.
pub fn to_pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("Error: failed to format result: {e}"))
}
