//! Filesystem slot storage
//!
//! # Directory Structure
//!
//! ```text
//! storage/
//! ├── account/
//! │   └── key.pem           # ACME account key pair
//! └── domains/
//!     └── example.com/
//!         ├── key.pem       # Domain key pair
//!         ├── dn.json       # CSR distinguished name
//!         └── cert.pem      # Certificate chain
//! ```
//!
//! # Commit Protocol
//!
//! A write is staged into a `.staging-*` file in the slot's own directory,
//! created owner-only, flushed, then renamed over the final name. The rename
//! is the only step that changes what readers see, so an interrupted write
//! leaves either the previous content or the new content. Key files are
//! `0600` from creation to commit.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use certvault_common::{DomainName, EntityKind, Owner, SlotKey};
use certvault_config::StorageConfig;
use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::{debug, info, trace, warn};

use super::SlotStore;
use crate::error::{StoreError, StoreResult};

/// File name prefix of uncommitted content
pub const STAGING_PREFIX: &str = ".staging-";

const ACCOUNT_DIR: &str = "account";
const DOMAINS_DIR: &str = "domains";

fn file_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::KeyPair => "key.pem",
        EntityKind::DistinguishedName => "dn.json",
        EntityKind::Certificate => "cert.pem",
    }
}

/// Slot storage on a local filesystem
#[derive(Debug)]
pub struct FsSlotStore {
    /// Base storage directory
    root: PathBuf,
    fsync: bool,
    directory_mode: u32,
    certificate_mode: u32,
    key_mode: u32,
}

impl FsSlotStore {
    /// Open (and create if needed) storage described by `config`
    ///
    /// Creates missing directories with the configured directory mode
    /// (0700 by default on Unix). Directories that already exist, including
    /// an operator-created root, keep their mode.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an invalid configuration and `Storage` if
    /// directories cannot be created or their permissions cannot be set.
    pub fn open(config: &StorageConfig) -> StoreResult<Self> {
        config
            .check()
            .map_err(|e| StoreError::InvalidInput(e.to_string()))?;

        let store = Self {
            root: config.path.clone(),
            fsync: config.fsync,
            directory_mode: config.directory_mode,
            certificate_mode: config.certificate_mode,
            key_mode: config.key_mode(),
        };

        store.ensure_dir(&store.root)?;
        store.ensure_dir(&store.root.join(ACCOUNT_DIR))?;
        store.ensure_dir(&store.root.join(DOMAINS_DIR))?;

        info!(
            storage_path = %store.root.display(),
            fsync = store.fsync,
            "Initialized certificate storage"
        );

        Ok(store)
    }

    /// Get the storage base path
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_dir(&self, slot: &SlotKey) -> PathBuf {
        match slot.owner() {
            Owner::Account => self.root.join(ACCOUNT_DIR),
            Owner::Domain(domain) => self.root.join(DOMAINS_DIR).join(domain.as_str()),
        }
    }

    /// Final location of a slot's committed content
    pub fn slot_path(&self, slot: &SlotKey) -> PathBuf {
        self.slot_dir(slot).join(file_name(slot.kind()))
    }

    fn mode_for(&self, slot: &SlotKey) -> u32 {
        if slot.is_secret() {
            self.key_mode
        } else {
            self.certificate_mode
        }
    }

    /// Create `path` with the directory mode; existing directories keep theirs
    fn ensure_dir(&self, path: &Path) -> StoreResult<()> {
        if path.is_dir() {
            return Ok(());
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
            fs::DirBuilder::new()
                .recursive(true)
                .mode(self.directory_mode)
                .create(path)
                .map_err(|e| StoreError::storage(path.display(), e))?;
            // DirBuilder modes are filtered by the umask
            fs::set_permissions(path, fs::Permissions::from_mode(self.directory_mode))
                .map_err(|e| StoreError::storage(path.display(), e))?;
        }
        #[cfg(not(unix))]
        fs::create_dir_all(path).map_err(|e| StoreError::storage(path.display(), e))?;

        Ok(())
    }

    /// Stage new content for a slot without publishing it
    ///
    /// The returned [`StagedWrite`] publishes on [`StagedWrite::commit`].
    /// Dropping it instead removes the staging file and leaves the slot
    /// untouched.
    pub fn stage(&self, slot: &SlotKey, bytes: &[u8]) -> StoreResult<StagedWrite> {
        let dir = self.slot_dir(slot);
        self.ensure_dir(&dir)?;

        // tempfile creates the file 0600
        let mut temp = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(&dir)
            .map_err(|e| StoreError::storage(slot, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            temp.as_file()
                .set_permissions(fs::Permissions::from_mode(self.mode_for(slot)))
                .map_err(|e| StoreError::storage(slot, e))?;
        }

        temp.write_all(bytes)
            .map_err(|e| StoreError::storage(slot, e))?;
        if self.fsync {
            temp.as_file()
                .sync_all()
                .map_err(|e| StoreError::storage(slot, e))?;
        }

        trace!(
            slot = %slot,
            staging_path = %temp.path().display(),
            size = bytes.len(),
            "Staged slot content"
        );

        Ok(StagedWrite {
            slot: slot.clone(),
            target: self.slot_path(slot),
            dir,
            fsync: self.fsync,
            temp,
        })
    }

    /// Remove staging files left behind by interrupted writes
    ///
    /// Committed content is never touched. Call before starting writers;
    /// a concurrent stage in progress would lose its staging file.
    pub fn sweep_staging(&self) -> StoreResult<usize> {
        let mut dirs = vec![self.root.join(ACCOUNT_DIR)];
        for domain in self.list_domains()? {
            dirs.push(self.root.join(DOMAINS_DIR).join(domain.as_str()));
        }

        let mut removed = 0;
        for dir in dirs {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StoreError::storage(dir.display(), e)),
            };

            for entry in entries {
                let entry = entry.map_err(|e| StoreError::storage(dir.display(), e))?;
                let is_staging = entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.starts_with(STAGING_PREFIX));
                if !is_staging {
                    continue;
                }

                let path = entry.path();
                fs::remove_file(&path).map_err(|e| StoreError::storage(path.display(), e))?;
                warn!(path = %path.display(), "Removed leftover staging file");
                removed += 1;
            }
        }

        if removed > 0 {
            info!(removed, "Swept interrupted writes from storage");
        }
        Ok(removed)
    }
}

impl SlotStore for FsSlotStore {
    fn write(&self, slot: &SlotKey, bytes: &[u8]) -> StoreResult<()> {
        self.stage(slot, bytes)?.commit()
    }

    fn read(&self, slot: &SlotKey) -> StoreResult<Vec<u8>> {
        let path = self.slot_path(slot);

        match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => {
                warn!(slot = %slot, path = %path.display(), "Stored content is empty");
                Err(StoreError::corrupt(slot, "zero-length content"))
            }
            Ok(bytes) => {
                trace!(slot = %slot, size = bytes.len(), "Read slot content");
                Ok(bytes)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                trace!(slot = %slot, "Slot is absent");
                Err(StoreError::NotFound { slot: slot.clone() })
            }
            Err(e) => Err(StoreError::storage(slot, e)),
        }
    }

    fn exists(&self, slot: &SlotKey) -> bool {
        self.slot_path(slot).is_file()
    }

    fn modified(&self, slot: &SlotKey) -> Option<DateTime<Utc>> {
        let metadata = fs::metadata(self.slot_path(slot)).ok()?;
        metadata.modified().ok().map(DateTime::<Utc>::from)
    }

    fn list_domains(&self) -> StoreResult<Vec<DomainName>> {
        let domains_path = self.root.join(DOMAINS_DIR);

        let entries = match fs::read_dir(&domains_path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::storage(domains_path.display(), e)),
        };

        let mut domains = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::storage(domains_path.display(), e))?;
            let is_dir = entry
                .file_type()
                .map_err(|e| StoreError::storage(entry.path().display(), e))?
                .is_dir();
            if !is_dir {
                continue;
            }

            let name = entry.file_name();
            match name.to_str().map(DomainName::parse) {
                Some(Ok(domain)) if domain.as_str() == name.to_str().unwrap_or_default() => {
                    domains.push(domain)
                }
                _ => debug!(entry = ?name, "Skipping foreign directory in storage"),
            }
        }

        domains.sort();
        Ok(domains)
    }
}

/// Content written to a staging file but not yet published.
#[derive(Debug)]
pub struct StagedWrite {
    slot: SlotKey,
    target: PathBuf,
    dir: PathBuf,
    fsync: bool,
    temp: NamedTempFile,
}

impl StagedWrite {
    /// Path of the staging file
    pub fn staging_path(&self) -> &Path {
        self.temp.path()
    }

    /// Publish the staged content with an atomic rename
    pub fn commit(self) -> StoreResult<()> {
        let StagedWrite {
            slot,
            target,
            dir,
            fsync,
            temp,
        } = self;

        temp.persist(&target)
            .map_err(|e| StoreError::storage(&slot, e.error))?;
        if fsync {
            sync_dir(&dir).map_err(|e| StoreError::storage(dir.display(), e))?;
        }

        debug!(slot = %slot, path = %target.display(), "Committed slot");
        Ok(())
    }
}

/// Flush a directory entry change (the rename) to disk
#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
