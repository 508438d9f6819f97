//! Line identifiers.
//!
//! Lines minted by this client are 26 lowercase hex characters:
//!
//! ```text
//! 67a1b2c3 | 9f8e7d | 0000 | 1a2b3c4d
//! seconds    author   pad    random
//! ```
//!
//! Lines read back from the service may use older formats, so [`LineId`] does
//! not validate on construction. [`LineId::is_well_formed`] checks the format
//! of ids we generate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Total length of a generated line id.
pub const LINE_ID_LEN: usize = 26;

/// Opaque, stable identifier of one line within a page.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(String);

impl LineId {
    /// Wrap an id string as-is.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for ids in the generated format: 26 chars, lowercase hex only.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == LINE_ID_LEN
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LineId({})", self.0)
    }
}

impl From<&str> for LineId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for LineId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for LineId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed() {
        assert!(LineId::from("67a1b2c39f8e7d00001a2b3c4d").is_well_formed());
    }

    #[test]
    fn test_not_well_formed() {
        // Legacy 24-char object id
        assert!(!LineId::from("5f1e2d3c4b5a697887766554").is_well_formed());
        // Uppercase hex
        assert!(!LineId::from("67A1B2C39F8E7D00001A2B3C4D").is_well_formed());
        assert!(!LineId::from("").is_well_formed());
    }

    #[test]
    fn test_serde_transparent() {
        let id = LineId::from("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
        let back: LineId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(back, id);
    }
}
