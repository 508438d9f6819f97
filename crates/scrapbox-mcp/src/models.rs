//! MCP request types.
//!
//! These types define the API for the Scrapbox MCP server tools.

use rmcp::schemars;
use serde::Deserialize;

/// Fetch one page.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetPageRequest {
    #[schemars(description = "The title of the page to retrieve")]
    pub title: String,
    #[schemars(description = "Optional project name (uses default if not specified)")]
    pub project: Option<String>,
}

/// List pages in a project.
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct ListPagesRequest {
    #[schemars(description = "Optional project name (uses default if not specified)")]
    pub project: Option<String>,
    #[schemars(description = "Maximum number of pages to return (default: 100)")]
    pub limit: Option<u32>,
    #[schemars(description = "Number of pages to skip for pagination (default: 0)")]
    pub skip: Option<u32>,
}

/// Full-text search.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchPagesRequest {
    #[schemars(description = "The search query string")]
    pub query: String,
    #[schemars(description = "Optional project name (uses default if not specified)")]
    pub project: Option<String>,
    #[schemars(description = "Maximum number of results to return")]
    pub limit: Option<u32>,
}

/// Replace a page's content.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct EditPageRequest {
    #[schemars(description = "The title of the page to edit")]
    pub title: String,
    /// Whole page, first line is the title.
    #[schemars(
        description = "The new content for the page (multiple lines separated by newlines). The first line should be the page title."
    )]
    pub content: String,
    #[schemars(description = "Optional project name (uses default if not specified)")]
    pub project: Option<String>,
}

/// Insert lines after a target line.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct InsertLinesRequest {
    #[schemars(description = "The title of the page to insert lines into")]
    pub title: String,
    #[schemars(
        description = "The lines to insert (can be a single line or multiple lines separated by newlines)"
    )]
    pub new_lines: String,
    #[schemars(description = "The line after which to insert new lines (or empty to append at end)")]
    pub target_line: Option<String>,
    #[schemars(description = "Optional project name (uses default if not specified)")]
    pub project: Option<String>,
}

/// Create a page.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreatePageRequest {
    #[schemars(description = "The title of the new page")]
    pub title: String,
    #[schemars(
        description = "The body content of the page (can be multiple lines separated by newlines)"
    )]
    pub body: Option<String>,
    #[schemars(description = "Optional project name (uses default if not specified)")]
    pub project: Option<String>,
}
