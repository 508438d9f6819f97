//! Shapes returned by the read API.
//!
//! Field names follow the service's camelCase JSON. Most fields default when
//! absent: a page that has never been written comes back with an id, a title,
//! and an empty `commitId`.

use serde::{Deserialize, Serialize};

use crate::ids::LineId;

/// A user account. `id` doubles as the commit author and seeds line ids.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub photo: String,
}

/// A project (the collection that owns pages).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

/// One line of a page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub id: LineId,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<i64>,
}

impl Line {
    /// A bare line with no authorship metadata.
    pub fn new(id: impl Into<LineId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            user_id: None,
            created: None,
            updated: None,
        }
    }
}

/// A full page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub descriptions: Vec<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub pin: i64,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub linked: i64,
    /// Version token. Empty means the page has not been created yet.
    #[serde(default)]
    pub commit_id: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub updated: i64,
    #[serde(default)]
    pub accessed: i64,
    #[serde(default)]
    pub lines: Vec<Line>,
}

impl Page {
    /// Whether the service has accepted at least one commit for this page.
    pub fn exists(&self) -> bool {
        !self.commit_id.is_empty()
    }
}

/// Summary row in a page listing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub descriptions: Vec<String>,
    #[serde(default)]
    pub pin: i64,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub linked: i64,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub updated: i64,
    #[serde(default)]
    pub accessed: i64,
}

/// `GET /pages/{project}`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagesResponse {
    pub project_name: String,
    #[serde(default)]
    pub skip: i64,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub pages: Vec<PageInfo>,
}

/// A page hit in search results.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPageInfo {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<String>,
}

/// The parsed form of a search query.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub words: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
}

/// `GET /pages/{project}/search/query`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub project_name: String,
    #[serde(default)]
    pub search_query: String,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub pages: Vec<SearchPageInfo>,
    #[serde(default)]
    pub exists_exact_title_match: bool,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub query: SearchQuery,
    #[serde(default)]
    pub backend: String,
}
