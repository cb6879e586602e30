use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Invalid file key: key is empty")]
    Empty,

    #[error("Invalid file key: `{0}` contains a parent directory reference")]
    Traversal(String),

    #[error("Invalid file key: `{0}` is absolute")]
    Absolute(String),

    /// `a//b`, `./a`, `a/`: segments a path would normalize away.
    #[error("Invalid file key: `{0}` has an empty or `.` segment")]
    Segment(String),
}

/// Checks an object key before it reaches the object store.
///
/// Surrounding whitespace is trimmed; the trimmed key is returned. Every
/// accepted key splits on `/` into non-empty segments other than `.`.
pub fn validate_key(raw: &str) -> Result<String, KeyError> {
    let key = raw.trim();
    if key.is_empty() {
        return Err(KeyError::Empty);
    }
    if key.contains("..") {
        return Err(KeyError::Traversal(key.to_string()));
    }
    if key.starts_with('/') {
        return Err(KeyError::Absolute(key.to_string()));
    }
    if key.split('/').any(|segment| segment.is_empty() || segment == ".") {
        return Err(KeyError::Segment(key.to_string()));
    }
    Ok(key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_traversal_and_empty() {
        assert_eq!(
            validate_key("../secret"),
            Err(KeyError::Traversal("../secret".to_string()))
        );
        assert_eq!(validate_key(""), Err(KeyError::Empty));
        assert_eq!(validate_key("   "), Err(KeyError::Empty));
        assert!(validate_key("notes/../../etc/passwd").is_err());
        assert!(matches!(validate_key("/etc/passwd"), Err(KeyError::Absolute(_))));
    }

    #[test]
    fn test_rejects_segments_a_path_would_normalize() {
        for key in ["./a.md", "p//q.md", "p/./q.md", "notes/", "notes/."] {
            assert_eq!(
                validate_key(key),
                Err(KeyError::Segment(key.to_string())),
                "{key}"
            );
        }
        assert_eq!(validate_key(".env").unwrap(), ".env");
        assert_eq!(validate_key("a/.hidden/b.md").unwrap(), "a/.hidden/b.md");
    }

    #[test]
    fn test_accepts_plain_keys() {
        assert_eq!(validate_key("notes/a.md").unwrap(), "notes/a.md");
        assert_eq!(validate_key("  Daily Note.md ").unwrap(), "Daily Note.md");
        assert_eq!(
            validate_key("Менталка/Дофамін.md").unwrap(),
            "Менталка/Дофамін.md"
        );
    }
}
