//! Filesystem helpers for extraction.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use jarstarter_core::ports::ResourceBundle;
use tracing::{debug, warn};

use super::ProvisioningError;
use super::manifest::ManifestEntry;

/// Deepest directory nesting followed while walking a bundle.
const MAX_DEPTH: usize = 64;

/// Materialize every file reachable from the bundle root under `target`.
///
/// Returns the number of files written. Directories missing from the bundle
/// and files listed but not bundled are skipped with a warning.
pub(super) fn walk_bundle(
    bundle: &dyn ResourceBundle,
    target: &Path,
    executable_suffixes: &[String],
) -> Result<usize, ProvisioningError> {
    let mut pending = vec![(String::new(), 0_usize)];
    let mut written = 0;

    while let Some((dir, depth)) = pending.pop() {
        if depth > MAX_DEPTH {
            warn!(dir = %dir, "Bundle nesting too deep, skipping");
            continue;
        }

        let listing = bundle.list(&dir).map_err(|e| ProvisioningError::Bundle {
            path: dir.clone(),
            source: e,
        })?;
        let Some(lines) = listing else {
            warn!(dir = %dir, "Bundled directory has no manifest, skipping");
            continue;
        };

        for line in lines {
            match ManifestEntry::parse(&line)? {
                None => {}
                Some(ManifestEntry::Dir(name)) => {
                    let child = format!("{dir}{name}");
                    let path = target.join(&child);
                    fs::create_dir_all(&path).map_err(|e| write_error(&path, e))?;
                    pending.push((child, depth + 1));
                }
                Some(ManifestEntry::File(name)) => {
                    let relative = format!("{dir}{name}");
                    if extract_file(bundle, &relative, target, executable_suffixes)? {
                        written += 1;
                    }
                }
            }
        }
    }

    Ok(written)
}

fn extract_file(
    bundle: &dyn ResourceBundle,
    relative: &str,
    target: &Path,
    executable_suffixes: &[String],
) -> Result<bool, ProvisioningError> {
    let reader = bundle
        .open(relative)
        .map_err(|e| ProvisioningError::Bundle {
            path: relative.to_string(),
            source: e,
        })?;
    let Some(mut reader) = reader else {
        warn!(path = %relative, "Listed resource not bundled, skipping");
        return Ok(false);
    };

    let path = target.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| write_error(parent, e))?;
    }
    let mut file = File::create(&path).map_err(|e| write_error(&path, e))?;
    io::copy(&mut reader, &mut file).map_err(|e| write_error(&path, e))?;

    if executable_suffixes
        .iter()
        .any(|suffix| relative.ends_with(suffix.as_str()))
    {
        mark_executable(&path).map_err(|e| write_error(&path, e))?;
    }
    debug!(path = %relative, "Extracted");
    Ok(true)
}

/// Copy `reader` to `target` through a sibling temp file and a rename.
pub(super) fn copy_atomic(reader: &mut dyn Read, target: &Path) -> Result<(), ProvisioningError> {
    let name = target
        .file_name()
        .map_or_else(|| "payload".to_string(), |n| n.to_string_lossy().into_owned());
    let temp = target.with_file_name(format!(".{name}.{}.tmp", std::process::id()));

    write_then_rename(reader, &temp, target).map_err(|e| {
        let _ = fs::remove_file(&temp);
        write_error(target, e)
    })
}

fn write_then_rename(reader: &mut dyn Read, temp: &Path, target: &Path) -> io::Result<()> {
    let mut file = File::create(temp)?;
    io::copy(reader, &mut file)?;
    file.flush()?;
    file.sync_all()?;
    fs::rename(temp, target)
}

/// Whether `path` is a regular file with content.
pub(super) fn is_non_empty_file(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|m| m.is_file() && m.len() > 0)
}

/// Add the execute bits to `path`.
#[cfg(unix)]
pub(super) fn mark_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(permissions.mode() | 0o755);
    fs::set_permissions(path, permissions)
}

#[cfg(not(unix))]
pub(super) fn mark_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

fn write_error(path: &Path, source: io::Error) -> ProvisioningError {
    ProvisioningError::Write {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provision::StaticBundle;

    #[test]
    fn copy_atomic_leaves_no_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("app.jar");

        copy_atomic(&mut &b"content"[..], &target).unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"content");
        let names: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec!["app.jar"]);
    }

    #[test]
    fn walk_rejects_escaping_manifest_entries() {
        struct Evil;
        impl ResourceBundle for Evil {
            fn describe(&self) -> String {
                "evil".into()
            }
            fn list(&self, _dir: &str) -> io::Result<Option<Vec<String>>> {
                Ok(Some(vec!["../outside".into()]))
            }
            fn open(&self, _path: &str) -> io::Result<Option<Box<dyn Read + Send>>> {
                Ok(None)
            }
        }

        let tmp = tempfile::tempdir().unwrap();
        let err = walk_bundle(&Evil, tmp.path(), &[]).unwrap_err();
        assert!(matches!(err, ProvisioningError::InvalidEntry { .. }));
    }

    #[test]
    fn walk_extracts_nested_files() {
        static FILES: &[(&str, &[u8])] = &[("a", b"1"), ("sub/b", b"2")];
        let tmp = tempfile::tempdir().unwrap();

        let written = walk_bundle(&StaticBundle::new("t", FILES), tmp.path(), &[]).unwrap();

        assert_eq!(written, 2);
        assert_eq!(fs::read(tmp.path().join("sub/b")).unwrap(), b"2");
    }

    #[test]
    fn empty_file_is_not_usable() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("empty");
        fs::write(&path, b"").unwrap();
        assert!(!is_non_empty_file(&path));
        assert!(!is_non_empty_file(&tmp.path().join("missing")));
        fs::write(&path, b"x").unwrap();
        assert!(is_non_empty_file(&path));
    }
}
