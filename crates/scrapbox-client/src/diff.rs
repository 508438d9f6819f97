//! Position-aligned line diff.
//!
//! Turns "this page should now read `new`" into the per-line operations the
//! service understands. Lines are compared index by index, not by longest
//! common subsequence:
//!
//! 1. `i < min(old, new)`: text differs ⇒ `Update(old[i].id, new[i])`
//! 2. old longer: `Delete` from the last old line down to index `new.len()`
//! 3. new longer: `Insert` each extra line after the previous one, starting
//!    from the last old line's id (no anchor when the page was empty)
//!
//! A line added in the middle of unchanged content therefore comes out as a
//! run of updates followed by trailing inserts. Callers rely on this chaining,
//! so it is kept as-is.

use scrapbox_types::{Line, LineId, NewLine, Operation};

use crate::line_id::new_line_id;

/// Operations transforming `old` into `new`, minting ids for `user_id`.
pub fn diff_lines<S: AsRef<str>>(old: &[Line], new: &[S], user_id: &str) -> Vec<Operation> {
    diff_lines_with(old, new, || new_line_id(user_id))
}

/// [`diff_lines`] with a caller-supplied id source.
pub fn diff_lines_with<S, F>(old: &[Line], new: &[S], mut mint: F) -> Vec<Operation>
where
    S: AsRef<str>,
    F: FnMut() -> LineId,
{
    let mut ops = Vec::new();
    let common = old.len().min(new.len());

    for (line, text) in old.iter().zip(new).take(common) {
        let text = text.as_ref();
        if line.text != text {
            ops.push(Operation::Update {
                target: line.id.clone(),
                text: text.to_string(),
            });
        }
    }

    // Highest index first so the remaining indices stay put.
    for line in old[common..].iter().rev() {
        ops.push(Operation::Delete { target: line.id.clone() });
    }

    let mut anchor = old.last().map(|l| l.id.clone());
    for text in &new[common..] {
        let id = mint();
        ops.push(Operation::Insert {
            after: anchor.replace(id.clone()),
            line: NewLine { id, text: text.as_ref().to_string() },
        });
    }

    ops
}

/// Full text of `lines` with `inserted` spliced in after the first line whose
/// text equals `target`. An empty or missing target appends at the end.
pub fn splice_after<S: AsRef<str>>(lines: &[Line], target: &str, inserted: &[S]) -> Vec<String> {
    let mut out = Vec::with_capacity(lines.len() + inserted.len());
    let mut spliced = false;

    for line in lines {
        out.push(line.text.clone());
        if !spliced && !target.is_empty() && line.text == target {
            out.extend(inserted.iter().map(|s| s.as_ref().to_string()));
            spliced = true;
        }
    }

    if !spliced {
        out.extend(inserted.iter().map(|s| s.as_ref().to_string()));
    }
    out
}
