//! Object identifiers: derivation from an upload name, validation of caller input

use rand::Rng;
use thiserror::Error;

const MAX_NAME_LEN: usize = 128;
const MAX_ID_LEN: usize = 255;
const CIPHERTEXT_SUFFIX: &str = ".enc";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid object identifier: {0}")]
pub struct InvalidObjectId(pub &'static str);

/// Opaque, path-safe identifier of one stored ciphertext
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId(String);

impl ObjectId {
    /// Derive a fresh identifier from a human-readable name hint.
    ///
    /// Format: `file-<unix millis>-<random below 1e9>-<sanitized name>`.
    pub fn derive(name_hint: &str) -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
        Self(format!("file-{millis}-{suffix}-{}", sanitize_name(name_hint)))
    }

    /// Validate an identifier supplied by a caller.
    pub fn parse(text: &str) -> Result<Self, InvalidObjectId> {
        if text.is_empty() {
            return Err(InvalidObjectId("empty"));
        }
        if text.len() > MAX_ID_LEN {
            return Err(InvalidObjectId("too long"));
        }
        if text.starts_with('.') {
            return Err(InvalidObjectId("leading dot"));
        }
        if !text.bytes().all(is_safe_byte) {
            return Err(InvalidObjectId("unsupported character"));
        }
        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of the ciphertext object in the backing store
    pub fn storage_path(&self) -> String {
        format!("{}{CIPHERTEXT_SUFFIX}", self.0)
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_safe_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_')
}

/// Keep `[A-Za-z0-9._-]`, map everything else to `_`, strip leading dots.
fn sanitize_name(name: &str) -> String {
    // Browsers may send a full client path; only the last component matters
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let mut out: String = base
        .chars()
        .map(|c| {
            if c.is_ascii() && is_safe_byte(c as u8) {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = out.trim_start_matches('.').len();
    out.drain(..out.len() - trimmed);
    out.truncate(MAX_NAME_LEN);

    if out.is_empty() {
        "upload".to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_format() {
        let id = ObjectId::derive("report.pdf");
        let parts: Vec<&str> = id.as_str().splitn(4, '-').collect();

        assert_eq!(parts[0], "file");
        assert!(parts[1].parse::<i64>().is_ok());
        assert!(parts[2].parse::<u32>().unwrap() < 1_000_000_000);
        assert_eq!(parts[3], "report.pdf");
    }

    #[test]
    fn test_derive_is_parseable() {
        let id = ObjectId::derive("weird name (1).tar.gz");
        assert_eq!(ObjectId::parse(id.as_str()).unwrap(), id);
        assert!(id.as_str().ends_with("weird_name__1_.tar.gz"));
    }

    #[test]
    fn test_derive_same_name_distinct_ids() {
        let a = ObjectId::derive("a.txt");
        let b = ObjectId::derive("a.txt");
        assert_ne!(a, b);
    }

    #[test]
    fn test_sanitize_strips_paths() {
        assert_eq!(sanitize_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_name("C:\\Users\\me\\notes.txt"), "notes.txt");
        assert_eq!(sanitize_name("..."), "upload");
        assert_eq!(sanitize_name(""), "upload");
        assert_eq!(sanitize_name(".hidden"), "hidden");
    }

    #[test]
    fn test_sanitize_non_ascii() {
        assert_eq!(sanitize_name("résumé.txt"), "r_sum_.txt");
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "x".repeat(500);
        assert_eq!(sanitize_name(&long).len(), MAX_NAME_LEN);
    }

    #[test]
    fn test_parse_rejects_traversal() {
        assert_eq!(
            ObjectId::parse("../secret"),
            Err(InvalidObjectId("leading dot"))
        );
        assert_eq!(
            ObjectId::parse("a/b"),
            Err(InvalidObjectId("unsupported character"))
        );
        assert_eq!(ObjectId::parse(""), Err(InvalidObjectId("empty")));
        assert_eq!(
            ObjectId::parse(&"a".repeat(MAX_ID_LEN + 1)),
            Err(InvalidObjectId("too long"))
        );
    }

    #[test]
    fn test_storage_path_suffix() {
        let id = ObjectId::parse("file-1-2-a.txt").unwrap();
        assert_eq!(id.storage_path(), "file-1-2-a.txt.enc");
    }
}
