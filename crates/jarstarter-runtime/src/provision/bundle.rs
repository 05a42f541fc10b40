//! Resource bundle implementations.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use jarstarter_core::ports::ResourceBundle;

/// Name of the optional per-directory manifest file in a [`DirBundle`].
pub const MANIFEST_FILE: &str = ".manifest";

/// Bundle backed by a directory shipped next to the launcher.
///
/// A directory's manifest is its `.manifest` file when present, otherwise
/// its sorted listing with `/` appended to sub-directories.
#[derive(Debug, Clone)]
pub struct DirBundle {
    root: PathBuf,
}

impl DirBundle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

impl ResourceBundle for DirBundle {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn list(&self, dir: &str) -> io::Result<Option<Vec<String>>> {
        let path = self.resolve(dir);
        if !path.is_dir() {
            return Ok(None);
        }

        let manifest = path.join(MANIFEST_FILE);
        if manifest.is_file() {
            let content = fs::read_to_string(&manifest)?;
            return Ok(Some(content.lines().map(str::to_string).collect()));
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&path)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == MANIFEST_FILE {
                continue;
            }
            if entry.file_type()?.is_dir() {
                entries.push(format!("{name}/"));
            } else {
                entries.push(name);
            }
        }
        entries.sort();
        Ok(Some(entries))
    }

    fn open(&self, path: &str) -> io::Result<Option<Box<dyn Read + Send>>> {
        let path = self.resolve(path);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(Box::new(File::open(path)?)))
    }
}

/// Bundle compiled into the binary.
///
/// Entries are `(path, bytes)` pairs, typically built with `include_bytes!`.
/// Directory listings are derived from the entry paths.
#[derive(Debug, Clone, Copy)]
pub struct StaticBundle {
    name: &'static str,
    entries: &'static [(&'static str, &'static [u8])],
}

impl StaticBundle {
    pub const fn new(name: &'static str, entries: &'static [(&'static str, &'static [u8])]) -> Self {
        Self { name, entries }
    }
}

impl ResourceBundle for StaticBundle {
    fn describe(&self) -> String {
        format!("embedded:{}", self.name)
    }

    fn list(&self, dir: &str) -> io::Result<Option<Vec<String>>> {
        let children: BTreeSet<String> = self
            .entries
            .iter()
            .filter_map(|(path, _)| path.strip_prefix(dir))
            .filter(|rest| !rest.is_empty())
            .map(|rest| match rest.find('/') {
                Some(idx) => rest[..=idx].to_string(),
                None => rest.to_string(),
            })
            .collect();

        if children.is_empty() && !dir.is_empty() {
            return Ok(None);
        }
        Ok(Some(children.into_iter().collect()))
    }

    fn open(&self, path: &str) -> io::Result<Option<Box<dyn Read + Send>>> {
        Ok(self
            .entries
            .iter()
            .find(|(p, _)| *p == path)
            .map(|(_, bytes)| Box::new(Cursor::new(*bytes)) as Box<dyn Read + Send>))
    }
}
