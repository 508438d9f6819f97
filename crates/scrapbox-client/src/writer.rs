//! Edit submission: fetch, diff, commit, await acknowledgement.
//!
//! Every entry point re-reads the page first and sends its current version
//! token as the commit's parent. A stale token comes back as
//! [`SocketError::Commit`]; callers re-read before retrying.

use std::sync::Arc;

use async_trait::async_trait;
use scrapbox_types::{Change, Commit, NewLine, Page};
use serde_json::Value;

use crate::ClientError;
use crate::diff::{diff_lines, splice_after};
use crate::line_id::new_line_id;
use crate::rest::RestError;
use crate::socket::{SocketClient, SocketError};

/// What the write path needs from the read path.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Current state of a page. A page that was never created comes back
    /// with an empty version token.
    async fn page(&self, project: &str, title: &str) -> Result<Page, RestError>;

    /// Author id for commits and minted line ids.
    async fn user_id(&self) -> Result<String, RestError>;

    /// Collection id of `project`.
    async fn project_id(&self, project: &str) -> Result<String, RestError>;
}

/// Result of a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The page already had the requested content; nothing was sent.
    Unchanged,
    /// A patch commit with this many line operations was accepted.
    Committed { changes: usize },
    /// A new page with this many lines (title included) was created.
    Created { lines: usize },
}

pub struct PageWriter<S> {
    source: Arc<S>,
    socket: Arc<SocketClient>,
}

impl<S: PageSource> PageWriter<S> {
    pub fn new(source: Arc<S>, socket: Arc<SocketClient>) -> Self {
        Self { source, socket }
    }

    /// Make the page read `lines`, title line included.
    pub async fn replace_lines<T: AsRef<str>>(
        &self,
        project: &str,
        title: &str,
        lines: &[T],
    ) -> Result<WriteOutcome, ClientError> {
        self.socket.connect().await?;
        let page = self.source.page(project, title).await?;
        let (user_id, project_id) = self.ids(project).await?;
        self.patch(&page, &project_id, &user_id, lines).await
    }

    /// Insert `lines` after the first line whose text equals `target`, or at
    /// the end when `target` is empty or not on the page.
    pub async fn insert_lines<T: AsRef<str>>(
        &self,
        project: &str,
        title: &str,
        target: &str,
        lines: &[T],
    ) -> Result<WriteOutcome, ClientError> {
        self.socket.connect().await?;
        let page = self.source.page(project, title).await?;
        let (user_id, project_id) = self.ids(project).await?;
        let texts = splice_after(&page.lines, target, lines);
        self.patch(&page, &project_id, &user_id, &texts).await
    }

    /// Create `title` with `body`. An existing page is overwritten with
    /// `[title, body...]` instead.
    pub async fn create_page<T: AsRef<str>>(
        &self,
        project: &str,
        title: &str,
        body: &[T],
    ) -> Result<WriteOutcome, ClientError> {
        self.socket.connect().await?;
        let page = self.source.page(project, title).await?;
        let (user_id, project_id) = self.ids(project).await?;

        if page.exists() {
            tracing::info!(title, "page exists, replacing content");
            let texts: Vec<&str> = std::iter::once(title)
                .chain(body.iter().map(AsRef::as_ref))
                .collect();
            return self.patch(&page, &project_id, &user_id, &texts).await;
        }

        let lines: Vec<NewLine> = std::iter::once(title)
            .chain(body.iter().map(AsRef::as_ref))
            .map(|text| NewLine {
                id: new_line_id(&user_id),
                text: text.to_string(),
            })
            .collect();
        let count = lines.len();

        let commit = Commit::new(
            project_id,
            page.id.as_str(),
            None,
            user_id,
            vec![Change::Title { title: title.to_string() }, Change::Lines { lines }],
        );
        self.submit(&commit).await?;
        Ok(WriteOutcome::Created { lines: count })
    }

    async fn ids(&self, project: &str) -> Result<(String, String), RestError> {
        tokio::try_join!(self.source.user_id(), self.source.project_id(project))
    }

    async fn patch<T: AsRef<str>>(
        &self,
        page: &Page,
        project_id: &str,
        user_id: &str,
        lines: &[T],
    ) -> Result<WriteOutcome, ClientError> {
        let ops = diff_lines(&page.lines, lines, user_id);
        if ops.is_empty() {
            tracing::debug!(page_id = %page.id, "no changes, skipping commit");
            return Ok(WriteOutcome::Unchanged);
        }

        // The token goes out as read, empty for a page with no commits yet.
        let changes = ops.len();
        let commit = Commit::new(
            project_id,
            page.id.as_str(),
            Some(page.commit_id.clone()),
            user_id,
            ops.into_iter().map(Change::from).collect(),
        );
        self.submit(&commit).await?;
        Ok(WriteOutcome::Committed { changes })
    }

    async fn submit(&self, commit: &Commit) -> Result<Value, ClientError> {
        let payload = commit.request_payload().map_err(SocketError::from)?;
        tracing::info!(
            page_id = %commit.page_id,
            changes = commit.changes.len(),
            "submitting commit"
        );
        let ack = self.socket.request(&payload).await?;
        tracing::debug!(page_id = %commit.page_id, "commit accepted");
        Ok(ack)
    }
}
