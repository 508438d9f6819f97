//! Shared page, line, and commit types for the Scrapbox write protocol.
//!
//! This crate is a pure leaf: typed line IDs, the page shapes returned by the
//! read API, and the commit envelope sent over the socket. It has **no
//! internal dependencies** and performs no I/O.
//!
//! # Relationships
//!
//! ```text
//! Project (collection id)
//!     └── Page (page id, title, commitId = version token)
//!             └── Line (LineId, text)  ← ordered, ids stable across edits
//!
//! Commit (projectId, pageId, parentId = expected commitId, userId)
//!     └── Change*  ← applied by the service in array order
//!             ├── Operation::Insert { after, line }
//!             ├── Operation::Update { target, text }
//!             ├── Operation::Delete { target }
//!             └── Title / Lines snapshot (page creation only)
//! ```
//!
//! # Key Types
//!
//! |--------------------|----------------------------------------------|
//! | Type               | Purpose                                      |
//! |--------------------|----------------------------------------------|
//! | [`LineId`]         | Stable line address (26 hex chars for ours)  |
//! | [`Page`]           | Full page as returned by the read API        |
//! | [`Operation`]      | Insert / Update / Delete on one line         |
//! | [`Change`]         | One element of a commit's `changes` array    |
//! | [`Commit`]         | The `data` object of a commit request        |
//! |--------------------|----------------------------------------------|

pub mod commit;
pub mod ids;
pub mod page;

pub use commit::{Change, Commit, NewLine, Operation};
pub use ids::LineId;
pub use page::{
    Line, Page, PageInfo, PagesResponse, Project, SearchPageInfo, SearchQuery, SearchResponse,
    User,
};
