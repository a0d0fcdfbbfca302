// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed store, home directory, and
// generations directory plus a fluent manifest builder so each integration
// test can set up an isolated environment without repeating filesystem
// boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::Result;
use homegen::cli::{ActivateOpts, BuildOpts, DeactivateOpts, GlobalOpts};
use homegen::commands;
use homegen::logging::Logger;

/// An isolated store/home/generations layout backed by a
/// [`tempfile::TempDir`].
pub struct Fixture {
    /// Temporary directory holding everything else.
    pub root: tempfile::TempDir,
    /// Options passed to every command.
    pub global: GlobalOpts,
}

impl Fixture {
    /// Create the layout with backups off and parallelism on.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        for dir in ["store", "home", "gens"] {
            fs::create_dir_all(root.path().join(dir)).expect("create fixture dir");
        }
        let global = GlobalOpts {
            dry_run: false,
            home: Some(root.path().join("home")),
            backup_ext: None,
            backup_overwrite: false,
            store_dir: Some(root.path().join("store")),
            parallel: true,
        };
        Self { root, global }
    }

    /// The live root.
    pub fn home(&self) -> PathBuf {
        self.root.path().join("home")
    }

    /// A generation root (not created).
    pub fn generation(&self, name: &str) -> PathBuf {
        self.root.path().join("gens").join(name)
    }

    /// A scratch file outside home, store, and generations.
    pub fn scratch(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    /// Write a store file and return its path.
    pub fn store_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.path().join("store").join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create store parent");
        }
        fs::write(&path, content).expect("write store file");
        path
    }

    /// Write a file directly into the live root.
    pub fn home_file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.home().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create home parent");
        }
        fs::write(&path, content).expect("write home file");
        path
    }

    /// Start a manifest named `name`.
    pub fn manifest(&self, name: &str) -> ManifestBuilder {
        ManifestBuilder {
            path: self.root.path().join(format!("{name}.toml")),
            body: String::new(),
        }
    }

    fn logger() -> Arc<Logger> {
        Arc::new(Logger::new("test"))
    }

    /// Run `activate`, returning the logger for summary inspection.
    pub fn activate(&self, manifest: &Path, new: &str, old: Option<&str>) -> (Result<()>, Arc<Logger>) {
        self.activate_with(manifest, new, old, Arc::new(AtomicBool::new(false)))
    }

    /// Run `activate` with a caller-controlled interrupt flag.
    pub fn activate_with(
        &self,
        manifest: &Path,
        new: &str,
        old: Option<&str>,
        interrupted: Arc<AtomicBool>,
    ) -> (Result<()>, Arc<Logger>) {
        let opts = ActivateOpts {
            manifest: manifest.to_path_buf(),
            new_root: self.generation(new),
            old_root: old.map(|o| self.generation(o)),
        };
        let log = Self::logger();
        let result = commands::activate::run(&self.global, &opts, &log, interrupted);
        (result, log)
    }

    /// Run `build`.
    pub fn build(&self, manifest: &Path, out: &str) -> Result<()> {
        let opts = BuildOpts {
            manifest: manifest.to_path_buf(),
            out: self.generation(out),
        };
        commands::build::run(&self.global, &opts, &Self::logger(), Arc::new(AtomicBool::new(false)))
    }

    /// Run `deactivate`.
    pub fn deactivate(&self, old: &str) -> Result<()> {
        let opts = DeactivateOpts {
            old_root: self.generation(old),
        };
        commands::deactivate::run(
            &self.global,
            &opts,
            &Self::logger(),
            Arc::new(AtomicBool::new(false)),
        )
    }

    /// Where `rel` in the live root points, if it is a symlink.
    pub fn link_of(&self, rel: &str) -> Option<PathBuf> {
        fs::read_link(self.home().join(rel)).ok()
    }

    /// Whether anything (even a dangling link) exists at `rel`.
    pub fn exists(&self, rel: &str) -> bool {
        self.home().join(rel).symlink_metadata().is_ok()
    }

    /// Every path under the live root with its kind, sorted.
    pub fn home_listing(&self) -> Vec<String> {
        let home = self.home();
        let mut out: Vec<String> = walkdir::WalkDir::new(&home)
            .min_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .map(|e| {
                let rel = e.path().strip_prefix(&home).expect("under home").display().to_string();
                let kind = if e.path_is_symlink() {
                    format!(
                        "-> {}",
                        fs::read_link(e.path()).expect("read link").display()
                    )
                } else if e.file_type().is_dir() {
                    "dir".to_string()
                } else {
                    "file".to_string()
                };
                format!("{rel} {kind}")
            })
            .collect();
        out.sort();
        out
    }
}

/// Fluent builder for TOML manifests.
pub struct ManifestBuilder {
    path: PathBuf,
    body: String,
}

impl ManifestBuilder {
    /// Add a spec with only a target and source.
    pub fn file(self, name: &str, target: &str, source: &Path) -> Self {
        self.file_with(name, target, source, "")
    }

    /// Add a spec with extra raw TOML lines.
    pub fn file_with(mut self, name: &str, target: &str, source: &Path, extra: &str) -> Self {
        let _ = writeln!(
            self.body,
            "[files.{name}]\ntarget = \"{target}\"\nsource = \"{}\"\n{extra}",
            source.display()
        );
        self
    }

    /// Write the manifest and return its path.
    pub fn write(self) -> PathBuf {
        fs::write(&self.path, self.body).expect("write manifest");
        self.path
    }
}
