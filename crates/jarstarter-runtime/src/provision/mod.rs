//! Idempotent provisioning of the runtime and the payload artifact.
//!
//! Both resources are extracted at most once per machine: every call first
//! checks whether a usable copy already exists on disk and returns it
//! unchanged.
//!
//! # Runtime
//!
//! The bundled runtime tree is walked through its directory manifests and
//! materialized into a staging directory next to the final install location.
//! The staging directory is renamed into place only once the entry executable
//! is present, so an interrupted extraction never looks installed.
//!
//! # Payload
//!
//! Resolution order: cached copy, resource bundle, development build output.
//! The cached file is only ever replaced by an atomic rename.

mod bundle;
mod extract;
mod manifest;

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use jarstarter_core::paths::{LauncherPaths, PathError, ensure_writable_dir};
use jarstarter_core::ports::ResourceBundle;
use jarstarter_core::{PayloadSource, ProvisionedPayload, ProvisionedRuntime, Settings};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use bundle::{DirBundle, MANIFEST_FILE, StaticBundle};
pub use manifest::ManifestEntry;

use extract::{copy_atomic, is_non_empty_file, mark_executable, walk_bundle};

/// Errors that make the runtime or payload unusable.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// A target directory could not be created or is not writable.
    #[error("Cannot prepare directory: {0}")]
    Directory(#[from] PathError),

    /// Reading from the bundle failed.
    #[error("Failed to read bundled resource {path}: {source}")]
    Bundle {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Writing an extracted file failed.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A manifest entry would escape the extraction root.
    #[error("Invalid manifest entry {entry:?}: {reason}")]
    InvalidEntry { entry: String, reason: &'static str },

    /// The runtime entry executable is absent after extraction.
    #[error("Runtime extraction failed: {} not found after extraction", path.display())]
    EntryMissing { path: PathBuf },

    /// No source provided the payload artifact.
    #[error("Payload {name} not found (searched: {searched})")]
    PayloadNotFound { name: String, searched: String },
}

/// Extracts the runtime and payload from their bundles into the data root.
pub struct ResourceProvisioner {
    runtime_bundle: Arc<dyn ResourceBundle>,
    payload_bundle: Arc<dyn ResourceBundle>,
    runtime_dir: PathBuf,
    runtime_entry: String,
    executable_suffixes: Vec<String>,
    payload_dir: PathBuf,
    payload_file_name: String,
    dev_payload_path: Option<PathBuf>,
}

impl ResourceProvisioner {
    /// Create a provisioner reading from explicit bundles.
    pub fn new(
        paths: &LauncherPaths,
        settings: &Settings,
        runtime_bundle: Arc<dyn ResourceBundle>,
        payload_bundle: Arc<dyn ResourceBundle>,
    ) -> Self {
        Self {
            runtime_bundle,
            payload_bundle,
            runtime_dir: paths.runtime_dir.clone(),
            runtime_entry: settings.runtime_entry.clone(),
            executable_suffixes: settings.executable_suffixes.clone(),
            payload_dir: paths.payload_dir.clone(),
            payload_file_name: settings.payload_file_name.clone(),
            dev_payload_path: settings.dev_payload_path.clone(),
        }
    }

    /// Create a provisioner reading from the resource directories of `paths`.
    pub fn from_layout(paths: &LauncherPaths, settings: &Settings) -> Self {
        Self::new(
            paths,
            settings,
            Arc::new(DirBundle::new(paths.runtime_bundle_dir())),
            Arc::new(DirBundle::new(paths.payload_bundle_dir())),
        )
    }

    /// Absolute path the runtime entry executable ends up at.
    pub fn runtime_executable(&self) -> PathBuf {
        join_relative(&self.runtime_dir, &self.runtime_entry)
    }

    /// Absolute path of the cached payload artifact.
    pub fn payload_path(&self) -> PathBuf {
        self.payload_dir.join(&self.payload_file_name)
    }

    /// Ensure the runtime is extracted and return its entry executable.
    pub fn ensure_runtime(&self) -> Result<ProvisionedRuntime, ProvisioningError> {
        let executable = self.runtime_executable();
        if executable.is_file() {
            info!(path = %executable.display(), "Runtime already present, skipping extraction");
            return Ok(ProvisionedRuntime {
                executable_path: executable,
                ready: true,
                extracted: false,
            });
        }

        info!(
            source = %self.runtime_bundle.describe(),
            target = %self.runtime_dir.display(),
            "Runtime not found, extracting"
        );

        let parent = self
            .runtime_dir
            .parent()
            .unwrap_or(&self.runtime_dir)
            .to_path_buf();
        ensure_writable_dir(&parent)?;

        // Anything appearing at the target after this point is a concurrent install
        let stale_install = self.runtime_dir.exists();
        let staging = staging_dir(&self.runtime_dir);
        remove_dir_if_exists(&staging)?;
        fs::create_dir_all(&staging).map_err(|e| write_error(&staging, e))?;

        let extracted = walk_bundle(
            self.runtime_bundle.as_ref(),
            &staging,
            &self.executable_suffixes,
        );
        let count = match extracted {
            Ok(count) => count,
            Err(e) => {
                let _ = fs::remove_dir_all(&staging);
                return Err(e);
            }
        };

        let staged_entry = join_relative(&staging, &self.runtime_entry);
        if !staged_entry.is_file() {
            warn!(
                entry = %self.runtime_entry,
                files = count,
                "Runtime extraction finished without entry executable"
            );
            let _ = fs::remove_dir_all(&staging);
            return Err(ProvisioningError::EntryMissing { path: executable });
        }
        if let Err(e) = mark_executable(&staged_entry) {
            let _ = fs::remove_dir_all(&staging);
            return Err(write_error(&staged_entry, e));
        }

        if executable.is_file() {
            return Ok(self.adopt_installed(&staging, executable));
        }

        // A previous interrupted install without entry executable is discarded
        if stale_install {
            remove_dir_if_exists(&self.runtime_dir)?;
        }
        if let Err(e) = fs::rename(&staging, &self.runtime_dir) {
            if executable.is_file() {
                return Ok(self.adopt_installed(&staging, executable));
            }
            let _ = fs::remove_dir_all(&staging);
            return Err(write_error(&self.runtime_dir, e));
        }

        info!(
            path = %executable.display(),
            files = count,
            "Runtime extraction successful"
        );
        Ok(ProvisionedRuntime {
            executable_path: executable,
            ready: true,
            extracted: true,
        })
    }

    /// Another installer finished first: drop our copy and use theirs.
    fn adopt_installed(&self, staging: &Path, executable: PathBuf) -> ProvisionedRuntime {
        info!(
            path = %executable.display(),
            "Runtime installed concurrently, discarding staged copy"
        );
        if let Err(e) = fs::remove_dir_all(staging) {
            warn!(path = %staging.display(), error = %e, "Failed to remove staging directory");
        }
        debug!(target = %self.runtime_dir.display(), "Reusing installed runtime");
        ProvisionedRuntime {
            executable_path: executable,
            ready: true,
            extracted: false,
        }
    }

    /// Ensure the payload artifact is cached and return its path.
    pub fn ensure_payload(&self) -> Result<ProvisionedPayload, ProvisioningError> {
        let target = self.payload_path();
        let mut searched = Vec::new();

        // 1) Reuse a previous extraction
        if is_non_empty_file(&target) {
            info!(path = %target.display(), "Found existing extracted payload");
            return Ok(payload(target, PayloadSource::Cached));
        }
        debug!(path = %target.display(), "No existing extracted payload");
        searched.push(target.display().to_string());

        ensure_writable_dir(&self.payload_dir)?;

        // 2) Copy from the resource bundle
        let resource = self
            .payload_bundle
            .open(&self.payload_file_name)
            .map_err(|e| ProvisioningError::Bundle {
                path: self.payload_file_name.clone(),
                source: e,
            })?;
        searched.push(format!(
            "{}/{}",
            self.payload_bundle.describe(),
            self.payload_file_name
        ));
        match resource {
            Some(mut reader) => {
                info!(target = %target.display(), "Bundled payload found, copying");
                copy_atomic(&mut reader, &target)?;
                if is_non_empty_file(&target) {
                    info!("Payload extracted from bundle");
                    return Ok(payload(target, PayloadSource::Bundle));
                }
                warn!("Bundled payload is empty, discarding");
                let _ = fs::remove_file(&target);
            }
            None => {
                info!(source = %self.payload_bundle.describe(), "Bundled payload not found");
            }
        }

        // 3) Development build output
        if let Some(ref dev_path) = self.dev_payload_path {
            searched.push(dev_path.display().to_string());
            if is_non_empty_file(dev_path) {
                info!(source = %dev_path.display(), "Development payload found, copying");
                let mut reader = File::open(dev_path).map_err(|e| ProvisioningError::Bundle {
                    path: dev_path.display().to_string(),
                    source: e,
                })?;
                copy_atomic(&mut reader, &target)?;
                info!("Payload copied from development build");
                return Ok(payload(target, PayloadSource::DevFallback));
            }
            info!(path = %dev_path.display(), "Development payload not found");
        }

        // 4) Nothing left to try
        warn!(name = %self.payload_file_name, "No payload found in any location");
        Err(ProvisioningError::PayloadNotFound {
            name: self.payload_file_name.clone(),
            searched: searched.join(", "),
        })
    }

    /// Provision the runtime, then the payload.
    pub fn provision_all(
        &self,
    ) -> Result<(ProvisionedRuntime, ProvisionedPayload), ProvisioningError> {
        let runtime = self.ensure_runtime()?;
        let payload = self.ensure_payload()?;
        Ok((runtime, payload))
    }
}

fn payload(artifact_path: PathBuf, source: PayloadSource) -> ProvisionedPayload {
    ProvisionedPayload {
        artifact_path,
        ready: true,
        source,
    }
}

fn join_relative(root: &Path, relative: &str) -> PathBuf {
    relative
        .split(['/', '\\'])
        .filter(|part| !part.is_empty())
        .fold(root.to_path_buf(), |acc, part| acc.join(part))
}

/// Staging directory unique to this call, next to `target`.
fn staging_dir(target: &Path) -> PathBuf {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    let name = target
        .file_name()
        .map_or_else(|| "runtime".to_string(), |n| n.to_string_lossy().into_owned());
    let seq = NEXT.fetch_add(1, Ordering::Relaxed);
    target.with_file_name(format!(".{name}.{}-{seq}.partial", std::process::id()))
}

fn remove_dir_if_exists(path: &Path) -> Result<(), ProvisioningError> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(write_error(path, e)),
    }
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

    static RUNTIME: &[(&str, &[u8])] = &[
        ("bin/java", b"#!/bin/sh\nexec \"$@\"\n"),
        ("bin/unpack200.exe", b"MZ"),
        ("lib/rt.jar", b"classes"),
        ("lib/security/java.policy", b"grant {};"),
        ("release", b"JAVA_VERSION=\"1.8.0_202\""),
    ];

    static PAYLOAD: &[(&str, &[u8])] = &[("myJar.jar", b"PK\x03\x04payload")];

    static EMPTY: &[(&str, &[u8])] = &[];

    fn settings() -> Settings {
        Settings {
            runtime_entry: "bin/java".to_string(),
            dev_payload_path: None,
            ..Settings::default()
        }
    }

    fn provisioner(
        root: &Path,
        settings: &Settings,
        runtime: &'static [(&'static str, &'static [u8])],
        payload: &'static [(&'static str, &'static [u8])],
    ) -> ResourceProvisioner {
        let paths = LauncherPaths::from_roots(root, root.join("res"), &settings.runtime_version);
        ResourceProvisioner::new(
            &paths,
            settings,
            Arc::new(StaticBundle::new("runtime", runtime)),
            Arc::new(StaticBundle::new("payload", payload)),
        )
    }

    fn staging_leftovers(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .filter(|name| name.ends_with(".partial"))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn staging_dirs_are_unique_per_call() {
        let target = Path::new("/data/runtime/jdk");
        assert_ne!(staging_dir(target), staging_dir(target));
        assert_eq!(staging_dir(target).parent(), target.parent());
    }

    #[test]
    fn concurrent_installs_keep_one_runtime() {
        let tmp = tempfile::tempdir().unwrap();
        let p = Arc::new(provisioner(tmp.path(), &settings(), RUNTIME, PAYLOAD));

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let p = Arc::clone(&p);
                std::thread::spawn(move || p.ensure_runtime())
            })
            .collect();
        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();

        assert!(results.iter().any(|r| r.extracted));
        assert!(results.iter().all(|r| r.ready && r.executable_path.is_file()));
        let root = tmp.path().join("runtime").join("jdk1.8.0_202");
        assert_eq!(
            fs::read_to_string(root.join("lib/security/java.policy")).unwrap(),
            "grant {};"
        );
        assert!(staging_leftovers(&tmp.path().join("runtime")).is_empty());
    }

    #[test]
    fn runtime_is_extracted_once() {
        let tmp = tempfile::tempdir().unwrap();
        let p = provisioner(tmp.path(), &settings(), RUNTIME, PAYLOAD);

        let first = p.ensure_runtime().unwrap();
        assert!(first.extracted);
        assert!(first.ready);
        assert!(first.executable_path.is_file());
        assert!(first.executable_path.is_absolute());

        let second = p.ensure_runtime().unwrap();
        assert!(!second.extracted);
        assert_eq!(first.executable_path, second.executable_path);
    }

    #[test]
    fn runtime_tree_structure_is_preserved() {
        let tmp = tempfile::tempdir().unwrap();
        let p = provisioner(tmp.path(), &settings(), RUNTIME, PAYLOAD);
        let runtime = p.ensure_runtime().unwrap();

        let root = runtime.executable_path.parent().unwrap().parent().unwrap();
        assert_eq!(
            fs::read_to_string(root.join("lib/security/java.policy")).unwrap(),
            "grant {};"
        );
        assert!(root.join("release").is_file());
        assert!(staging_leftovers(root.parent().unwrap()).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn executables_are_marked() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let p = provisioner(tmp.path(), &settings(), RUNTIME, PAYLOAD);
        let runtime = p.ensure_runtime().unwrap();
        let root = runtime.executable_path.parent().unwrap();

        let mode = |path: &Path| fs::metadata(path).unwrap().permissions().mode();
        assert_ne!(mode(&runtime.executable_path) & 0o111, 0);
        assert_ne!(mode(&root.join("unpack200.exe")) & 0o111, 0);
        assert_eq!(mode(&root.parent().unwrap().join("release")) & 0o111, 0);
    }

    #[test]
    fn missing_entry_executable_is_fatal() {
        static NO_JAVA: &[(&str, &[u8])] = &[("lib/rt.jar", b"classes")];
        let tmp = tempfile::tempdir().unwrap();
        let p = provisioner(tmp.path(), &settings(), NO_JAVA, PAYLOAD);

        let err = p.ensure_runtime().unwrap_err();
        assert!(matches!(err, ProvisioningError::EntryMissing { .. }));
        assert!(!p.runtime_executable().exists());
        assert!(staging_leftovers(&tmp.path().join("runtime")).is_empty());
    }

    #[test]
    fn payload_is_copied_from_bundle_then_cached() {
        let tmp = tempfile::tempdir().unwrap();
        let p = provisioner(tmp.path(), &settings(), RUNTIME, PAYLOAD);

        let first = p.ensure_payload().unwrap();
        assert_eq!(first.source, PayloadSource::Bundle);
        assert_eq!(fs::read(&first.artifact_path).unwrap(), b"PK\x03\x04payload");

        let second = p.ensure_payload().unwrap();
        assert_eq!(second.source, PayloadSource::Cached);
        assert_eq!(first.artifact_path, second.artifact_path);
    }

    #[test]
    fn payload_falls_back_to_dev_build() {
        let tmp = tempfile::tempdir().unwrap();
        let dev = tmp.path().join("target").join("myJar.jar");
        fs::create_dir_all(dev.parent().unwrap()).unwrap();
        fs::write(&dev, b"dev build").unwrap();

        let settings = Settings {
            dev_payload_path: Some(dev),
            ..settings()
        };
        let p = provisioner(tmp.path(), &settings, RUNTIME, EMPTY);

        let payload = p.ensure_payload().unwrap();
        assert_eq!(payload.source, PayloadSource::DevFallback);
        assert_eq!(fs::read(&payload.artifact_path).unwrap(), b"dev build");
    }

    #[test]
    fn payload_not_found_lists_locations() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = Settings {
            dev_payload_path: Some(tmp.path().join("nowhere.jar")),
            ..settings()
        };
        let p = provisioner(tmp.path(), &settings, RUNTIME, EMPTY);

        match p.ensure_payload() {
            Err(ProvisioningError::PayloadNotFound { name, searched }) => {
                assert_eq!(name, "myJar.jar");
                assert!(searched.contains("nowhere.jar"));
                assert!(searched.contains("embedded:payload"));
            }
            other => panic!("expected PayloadNotFound, got {other:?}"),
        }
    }

    #[test]
    fn empty_cached_payload_is_replaced() {
        let tmp = tempfile::tempdir().unwrap();
        let p = provisioner(tmp.path(), &settings(), RUNTIME, PAYLOAD);
        fs::create_dir_all(p.payload_path().parent().unwrap()).unwrap();
        fs::write(p.payload_path(), b"").unwrap();

        let payload = p.ensure_payload().unwrap();
        assert_eq!(payload.source, PayloadSource::Bundle);
    }

    #[test]
    fn provision_all_yields_both_resources() {
        let tmp = tempfile::tempdir().unwrap();
        let p = provisioner(tmp.path(), &settings(), RUNTIME, PAYLOAD);

        let (runtime, payload) = p.provision_all().unwrap();
        assert!(runtime.ready && payload.ready);
        assert!(payload.artifact_path.starts_with(tmp.path()));
    }
}
