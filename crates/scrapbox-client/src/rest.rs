//! Read path: authenticated JSON GETs against the REST API.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::StatusCode;
use reqwest::header::COOKIE;
use scrapbox_types::{Page, PagesResponse, Project, SearchResponse, User};
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use url::Url;

use crate::constants::SESSION_COOKIE;
use crate::writer::PageSource;

#[derive(Debug, thiserror::Error)]
pub enum RestError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("authentication failed")]
    AuthFailed,
    #[error("unexpected status code: {0}")]
    Status(u16),
    #[error("failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

/// REST client for pages, listings, search, and account lookups.
///
/// The author id and per-project ids never change for a session, so both are
/// fetched once and cached.
pub struct RestClient {
    http: reqwest::Client,
    base: Url,
    session_id: Option<String>,
    me: OnceCell<User>,
    projects: DashMap<String, Project>,
}

impl RestClient {
    pub fn new(
        api_url: &str,
        session_id: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RestError> {
        let base =
            Url::parse(api_url).map_err(|e| RestError::InvalidUrl(format!("{api_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(RestError::InvalidUrl(api_url.to_string()));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base,
            session_id,
            me: OnceCell::new(),
            projects: DashMap::new(),
        })
    }

    pub async fn get_page(&self, project: &str, title: &str) -> Result<Page, RestError> {
        let url = page_url(&self.base, project, title)?;
        self.get_json(url, &format!("page {title}")).await
    }

    pub async fn list_pages(
        &self,
        project: &str,
        limit: u32,
        skip: u32,
    ) -> Result<PagesResponse, RestError> {
        let url = pages_url(&self.base, project, limit, skip)?;
        self.get_json(url, &format!("project {project}")).await
    }

    pub async fn search_pages(
        &self,
        project: &str,
        query: &str,
        limit: u32,
    ) -> Result<SearchResponse, RestError> {
        let url = search_url(&self.base, project, query, limit)?;
        self.get_json(url, &format!("project {project}")).await
    }

    /// The authenticated account. Cached after the first success.
    pub async fn me(&self) -> Result<&User, RestError> {
        self.me
            .get_or_try_init(|| async {
                let url = endpoint(&self.base, &["users", "me"])?;
                self.get_json::<User>(url, "current user").await
            })
            .await
    }

    /// Project metadata by name. Cached after the first success.
    pub async fn project(&self, name: &str) -> Result<Project, RestError> {
        if let Some(project) = self.projects.get(name) {
            return Ok(project.clone());
        }
        let url = endpoint(&self.base, &["projects", name])?;
        let project: Project = self.get_json(url, &format!("project {name}")).await?;
        self.projects.insert(name.to_string(), project.clone());
        Ok(project)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T, RestError> {
        tracing::debug!(path = url.path(), "GET");
        let mut request = self.http.get(url);
        if let Some(sid) = &self.session_id {
            request = request.header(COOKIE, format!("{SESSION_COOKIE}={sid}"));
        }
        let response = request.send().await?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(RestError::NotFound(what.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(RestError::AuthFailed),
            status => return Err(RestError::Status(status.as_u16())),
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base", &self.base.as_str())
            .field("authenticated", &self.session_id.is_some())
            .finish()
    }
}

#[async_trait]
impl PageSource for RestClient {
    async fn page(&self, project: &str, title: &str) -> Result<Page, RestError> {
        self.get_page(project, title).await
    }

    async fn user_id(&self) -> Result<String, RestError> {
        Ok(self.me().await?.id.clone())
    }

    async fn project_id(&self, project: &str) -> Result<String, RestError> {
        Ok(self.project(project).await?.id)
    }
}

// ============================================================================
// URL builders
// ============================================================================

/// `base` with `segments` appended, each percent-encoded as one segment.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, RestError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| RestError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub(crate) fn page_url(base: &Url, project: &str, title: &str) -> Result<Url, RestError> {
    endpoint(base, &["pages", project, title])
}

pub(crate) fn pages_url(base: &Url, project: &str, limit: u32, skip: u32) -> Result<Url, RestError> {
    let mut url = endpoint(base, &["pages", project])?;
    url.query_pairs_mut()
        .append_pair("limit", &limit.to_string())
        .append_pair("skip", &skip.to_string());
    Ok(url)
}

pub(crate) fn search_url(
    base: &Url,
    project: &str,
    query: &str,
    limit: u32,
) -> Result<Url, RestError> {
    let mut url = endpoint(base, &["pages", project, "search", "query"])?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("q", query);
        if limit > 0 {
            pairs.append_pair("limit", &limit.to_string());
        }
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://scrapbox.io/api").unwrap()
    }

    #[test]
    fn test_page_url_escapes_title() {
        let url = page_url(&base(), "proj", "日記 2024/01").unwrap();
        assert_eq!(
            url.as_str(),
            "https://scrapbox.io/api/pages/proj/%E6%97%A5%E8%A8%98%202024%2F01"
        );
    }

    #[test]
    fn test_trailing_slash_base() {
        let base = Url::parse("http://localhost:8080/api/").unwrap();
        let url = page_url(&base, "p", "t").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/pages/p/t");
    }

    #[test]
    fn test_pages_url() {
        let url = pages_url(&base(), "proj", 100, 20).unwrap();
        assert_eq!(url.as_str(), "https://scrapbox.io/api/pages/proj?limit=100&skip=20");
    }

    #[test]
    fn test_search_url_limit_optional() {
        let url = search_url(&base(), "proj", "rust async", 0).unwrap();
        assert_eq!(url.path(), "/api/pages/proj/search/query");
        assert_eq!(url.query(), Some("q=rust+async"));

        let url = search_url(&base(), "proj", "x", 5).unwrap();
        assert_eq!(url.query(), Some("q=x&limit=5"));
    }

    #[test]
    fn test_rejects_bad_base() {
        assert!(matches!(
            RestClient::new("mailto:nobody", None, Duration::from_secs(1)),
            Err(RestError::InvalidUrl(_))
        ));
        assert!(matches!(
            RestClient::new("::", None, Duration::from_secs(1)),
            Err(RestError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_debug_hides_session() {
        let client = RestClient::new("https://scrapbox.io/api", Some("s3cret".into()), Duration::from_secs(1)).unwrap();
        assert!(!format!("{client:?}").contains("s3cret"));
    }
}
