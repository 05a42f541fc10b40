//! Manifest line parsing.
//!
//! A directory manifest lists one entry per line. A trailing `/` marks a
//! sub-directory; anything else is a file. Blank lines and `#` comments are
//! ignored.

use super::ProvisioningError;

/// One parsed manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestEntry {
    /// Sub-directory name, including the trailing `/`.
    Dir(String),
    /// File name.
    File(String),
}

impl ManifestEntry {
    /// Parse a manifest line. Returns `Ok(None)` for lines carrying no entry.
    pub fn parse(line: &str) -> Result<Option<Self>, ProvisioningError> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }

        let normalized = trimmed.replace('\\', "/");
        validate_relative(&normalized)?;

        if normalized.ends_with('/') {
            Ok(Some(Self::Dir(normalized)))
        } else {
            Ok(Some(Self::File(normalized)))
        }
    }

    /// Entry path relative to the directory that listed it.
    pub fn name(&self) -> &str {
        match self {
            Self::Dir(name) | Self::File(name) => name,
        }
    }
}

/// Reject entries that could escape the extraction root.
fn validate_relative(entry: &str) -> Result<(), ProvisioningError> {
    let invalid = |reason| ProvisioningError::InvalidEntry {
        entry: entry.to_string(),
        reason,
    };

    if entry.starts_with('/') || entry.contains(':') {
        return Err(invalid("absolute paths are not allowed"));
    }
    if entry.split('/').any(|part| part == "..") {
        return Err(invalid("parent components are not allowed"));
    }
    if entry == "/" || entry == "./" {
        return Err(invalid("entry names the directory itself"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_marks_directory() {
        assert_eq!(
            ManifestEntry::parse("bin/").unwrap(),
            Some(ManifestEntry::Dir("bin/".into()))
        );
        assert_eq!(
            ManifestEntry::parse("  release \n").unwrap(),
            Some(ManifestEntry::File("release".into()))
        );
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert_eq!(ManifestEntry::parse("").unwrap(), None);
        assert_eq!(ManifestEntry::parse("   ").unwrap(), None);
        assert_eq!(ManifestEntry::parse("# generated").unwrap(), None);
    }

    #[test]
    fn escaping_entries_are_rejected() {
        for line in ["../evil", "lib/../../evil", "/etc/passwd", "C:/Windows"] {
            assert!(
                matches!(
                    ManifestEntry::parse(line),
                    Err(ProvisioningError::InvalidEntry { .. })
                ),
                "{line} should be rejected"
            );
        }
    }

    #[test]
    fn backslashes_are_normalized() {
        assert_eq!(
            ManifestEntry::parse("bin\\java.exe").unwrap(),
            Some(ManifestEntry::File("bin/java.exe".into()))
        );
    }
}
