//! Commit envelope and per-line operations.
//!
//! The service applies `changes` strictly in array order. An insert's `after`
//! must name a line that already exists or one inserted earlier in the same
//! commit; [`Operation::Insert`] with `after: None` appends at the end.
//!
//! Wire shapes:
//!
//! ```text
//! {"_insert": <afterId>, "lines": {"id": <id>, "text": <text>}}
//! {"_update": <id>,      "lines": {"text": <text>}}
//! {"_delete": <id>,      "lines": -1}
//! {"title": <title>}                      (creation only)
//! {"lines": [{"id":..,"text":..}, ...]}    (creation only)
//! ```

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::LineId;

/// Anchor sent for an insert with no preceding line.
pub const END_ANCHOR: &str = "_end";

/// Event name of a request that expects an acknowledgement.
pub const REQUEST_EVENT: &str = "socket.io-request";

/// A freshly minted line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLine {
    pub id: LineId,
    pub text: String,
}

/// One line-level edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    Insert { after: Option<LineId>, line: NewLine },
    Update { target: LineId, text: String },
    Delete { target: LineId },
}

impl Operation {
    /// The line this operation touches (the new line for inserts).
    pub fn line_id(&self) -> &LineId {
        match self {
            Operation::Insert { line, .. } => &line.id,
            Operation::Update { target, .. } | Operation::Delete { target } => target,
        }
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        match self {
            Operation::Insert { after, line } => {
                let anchor = after.as_ref().map(LineId::as_str).unwrap_or(END_ANCHOR);
                map.serialize_entry("_insert", anchor)?;
                map.serialize_entry("lines", line)?;
            }
            Operation::Update { target, text } => {
                map.serialize_entry("_update", target)?;
                map.serialize_entry("lines", &TextOnly { text })?;
            }
            Operation::Delete { target } => {
                map.serialize_entry("_delete", target)?;
                map.serialize_entry("lines", &-1)?;
            }
        }
        map.end()
    }
}

#[derive(Serialize)]
struct TextOnly<'a> {
    text: &'a str,
}

/// One element of a commit's `changes` array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Change {
    Op(Operation),
    Title { title: String },
    Lines { lines: Vec<NewLine> },
}

impl From<Operation> for Change {
    fn from(op: Operation) -> Self {
        Change::Op(op)
    }
}

/// The `data` object of a `commit` request.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    kind: &'static str,
    pub project_id: String,
    pub page_id: String,
    /// Expected current version; `None` only when creating the page.
    pub parent_id: Option<String>,
    pub user_id: String,
    pub changes: Vec<Change>,
    cursor: Option<Value>,
    freeze: bool,
}

impl Commit {
    pub fn new(
        project_id: impl Into<String>,
        page_id: impl Into<String>,
        parent_id: Option<String>,
        user_id: impl Into<String>,
        changes: Vec<Change>,
    ) -> Self {
        Self {
            kind: "page",
            project_id: project_id.into(),
            page_id: page_id.into(),
            parent_id,
            user_id: user_id.into(),
            changes,
            cursor: None,
            freeze: true,
        }
    }

    /// `["socket.io-request", {"method": "commit", "data": <commit>}]`
    pub fn request_payload(&self) -> Result<Value, serde_json::Error> {
        Ok(serde_json::json!([
            REQUEST_EVENT,
            { "method": "commit", "data": serde_json::to_value(self)? }
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nl(id: &str, text: &str) -> NewLine {
        NewLine { id: id.into(), text: text.to_string() }
    }

    #[test]
    fn test_insert_wire_shape() {
        let op = Operation::Insert { after: Some("a1".into()), line: nl("n1", "hi") };
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({"_insert": "a1", "lines": {"id": "n1", "text": "hi"}})
        );
    }

    #[test]
    fn test_insert_without_anchor_appends() {
        let op = Operation::Insert { after: None, line: nl("n1", "hi") };
        assert_eq!(serde_json::to_value(&op).unwrap()["_insert"], json!("_end"));
    }

    #[test]
    fn test_update_and_delete_wire_shape() {
        let up = Operation::Update { target: "x".into(), text: "new".into() };
        assert_eq!(
            serde_json::to_value(&up).unwrap(),
            json!({"_update": "x", "lines": {"text": "new"}})
        );
        let del = Operation::Delete { target: "y".into() };
        assert_eq!(serde_json::to_value(&del).unwrap(), json!({"_delete": "y", "lines": -1}));
    }

    #[test]
    fn test_commit_envelope() {
        let commit = Commit::new(
            "proj",
            "page",
            Some("c1".to_string()),
            "user",
            vec![Operation::Delete { target: "y".into() }.into()],
        );
        let payload = commit.request_payload().unwrap();
        assert_eq!(payload[0], json!("socket.io-request"));
        assert_eq!(payload[1]["method"], json!("commit"));

        let data = &payload[1]["data"];
        assert_eq!(data["kind"], json!("page"));
        assert_eq!(data["projectId"], json!("proj"));
        assert_eq!(data["pageId"], json!("page"));
        assert_eq!(data["parentId"], json!("c1"));
        assert_eq!(data["userId"], json!("user"));
        assert_eq!(data["cursor"], Value::Null);
        assert_eq!(data["freeze"], json!(true));
        assert_eq!(data["changes"], json!([{"_delete": "y", "lines": -1}]));
    }

    #[test]
    fn test_creation_changes() {
        let commit = Commit::new(
            "proj",
            "page",
            None,
            "user",
            vec![
                Change::Title { title: "T".into() },
                Change::Lines { lines: vec![nl("a", "T"), nl("b", "body")] },
            ],
        );
        let data = serde_json::to_value(&commit).unwrap();
        assert_eq!(data["parentId"], Value::Null);
        assert_eq!(
            data["changes"],
            json!([
                {"title": "T"},
                {"lines": [{"id": "a", "text": "T"}, {"id": "b", "text": "body"}]}
            ])
        );
    }
}
