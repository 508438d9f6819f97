//! MCP server exposing Scrapbox pages.
//!
//! Reads go through the REST API; edits are diffed against the current page
//! and committed over the persistent socket.
//!
//! ## Module Structure
//!
//! - `models`: Request types for MCP tools
//! - `helpers`: Argument parsing and result formatting

mod helpers;
mod models;

use std::sync::Arc;

use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};

use scrapbox_client::{ScrapboxClient, WriteOutcome};

use helpers::*;
pub use models::*;

/// Page count returned by `list_pages` when no limit is given.
pub const DEFAULT_LIST_LIMIT: u32 = 100;

/// MCP server over one [`ScrapboxClient`].
#[derive(Clone)]
pub struct ScrapboxMcp {
    client: Arc<ScrapboxClient>,
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for ScrapboxMcp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrapboxMcp")
            .field("client", &self.client)
            .field("tool_router", &self.tool_router)
            .finish()
    }
}

impl ScrapboxMcp {
    pub fn new(client: ScrapboxClient) -> Self {
        Self {
            client: Arc::new(client),
            tool_router: Self::tool_router(),
        }
    }

    pub fn client(&self) -> &ScrapboxClient {
        &self.client
    }
}

#[tool_router]
impl ScrapboxMcp {
    // ========================================================================
    // Read Tools
    // ========================================================================

    #[tool(description = "Retrieves a Scrapbox page by title. Returns the page content including all lines, metadata, and links.")]
    #[tracing::instrument(skip(self, req), name = "mcp.get_page")]
    async fn get_page(&self, Parameters(req): Parameters<GetPageRequest>) -> String {
        if let Err(e) = require("title", &req.title) {
            return e;
        }
        let project = self.client.resolve_project(req.project.as_deref());

        match self.client.rest().get_page(project, &req.title).await {
            Ok(page) => to_pretty(&page),
            Err(e) => format!("Error: {e}"),
        }
    }

    #[tool(description = "Lists all pages in the Scrapbox project. Supports pagination with limit and skip parameters.")]
    #[tracing::instrument(skip(self, req), name = "mcp.list_pages")]
    async fn list_pages(&self, Parameters(req): Parameters<ListPagesRequest>) -> String {
        let project = self.client.resolve_project(req.project.as_deref());
        let limit = req.limit.unwrap_or(DEFAULT_LIST_LIMIT);
        let skip = req.skip.unwrap_or(0);

        match self.client.rest().list_pages(project, limit, skip).await {
            Ok(pages) => to_pretty(&pages),
            Err(e) => format!("Error: {e}"),
        }
    }

    #[tool(description = "Searches for pages containing the specified query string. Returns matching pages with their metadata.")]
    #[tracing::instrument(skip(self, req), name = "mcp.search_pages")]
    async fn search_pages(&self, Parameters(req): Parameters<SearchPagesRequest>) -> String {
        if let Err(e) = require("query", &req.query) {
            return e;
        }
        let project = self.client.resolve_project(req.project.as_deref());

        match self
            .client
            .rest()
            .search_pages(project, &req.query, req.limit.unwrap_or(0))
            .await
        {
            Ok(results) => to_pretty(&results),
            Err(e) => format!("Error: {e}"),
        }
    }

    // ========================================================================
    // Write Tools
    // ========================================================================

    #[tool(description = "Replaces the content of an existing Scrapbox page. Only changed lines are sent; the first line of content is the page title.")]
    #[tracing::instrument(skip(self, req), name = "mcp.edit_page")]
    async fn edit_page(&self, Parameters(req): Parameters<EditPageRequest>) -> String {
        if let Err(e) = require("title", &req.title) {
            return e;
        }
        if let Err(e) = require("content", &req.content) {
            return e;
        }
        let project = self.client.resolve_project(req.project.as_deref());
        let lines = split_lines(&req.content);

        match self.client.writer().replace_lines(project, &req.title, &lines).await {
            Ok(WriteOutcome::Unchanged) => format!(
                "Page '{}' in project '{project}' already has this content",
                req.title
            ),
            Ok(_) => format!(
                "Successfully edited page '{}' in project '{project}' ({} lines)",
                req.title,
                lines.len()
            ),
            Err(e) => format!("Error: failed to edit page: {e}"),
        }
    }

    #[tool(description = "Inserts lines into a Scrapbox page after the first line matching target_line, or at the end when target_line is empty or not found.")]
    #[tracing::instrument(skip(self, req), name = "mcp.insert_lines")]
    async fn insert_lines(&self, Parameters(req): Parameters<InsertLinesRequest>) -> String {
        if let Err(e) = require("title", &req.title) {
            return e;
        }
        if let Err(e) = require("new_lines", &req.new_lines) {
            return e;
        }
        let project = self.client.resolve_project(req.project.as_deref());
        let target = req.target_line.as_deref().unwrap_or_default();
        let lines = split_lines(&req.new_lines);

        match self
            .client
            .writer()
            .insert_lines(project, &req.title, target, &lines)
            .await
        {
            Ok(_) => format!(
                "Successfully inserted {} line(s) into page '{}' in project '{project}'",
                lines.len(),
                req.title
            ),
            Err(e) => format!("Error: failed to insert lines: {e}"),
        }
    }

    #[tool(description = "Creates a new Scrapbox page with the specified title and body content. If the page already exists, its content is replaced with the title and body.")]
    #[tracing::instrument(skip(self, req), name = "mcp.create_page")]
    async fn create_page(&self, Parameters(req): Parameters<CreatePageRequest>) -> String {
        if let Err(e) = require("title", &req.title) {
            return e;
        }
        let project = self.client.resolve_project(req.project.as_deref());
        let body = body_lines(req.body.as_deref());
        let url = page_url(project, &req.title);

        match self.client.writer().create_page(project, &req.title, &body).await {
            Ok(WriteOutcome::Created { .. }) => format!(
                "Successfully created page '{}' in project '{project}'\nURL: {url}",
                req.title
            ),
            Ok(_) => format!(
                "Page '{}' already existed in project '{project}'; its content was updated\nURL: {url}",
                req.title
            ),
            Err(e) => format!("Error: failed to create page: {e}"),
        }
    }
}

#[tool_handler]
impl ServerHandler for ScrapboxMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build()).with_instructions(
            format!(
                "Scrapbox MCP server. Reads, searches, and edits pages in Scrapbox projects \
                 (default project: {}). Edits are line-level commits against the page's current version.",
                self.client.project()
            ),
        )
    }
}
