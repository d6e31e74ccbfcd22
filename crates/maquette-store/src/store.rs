use std::path::PathBuf;

use bytes::Bytes;
use maquette_net::Headers;
use tracing::{debug, trace, warn};
use url::Url;

use crate::{
    atomic_write::write_atomic,
    entry::{StoredEntry, StoredMeta, CACHED_TIME_HEADER},
    error::StoreResult,
    hash::EntryHash,
    now_ms,
    options::StoreOptions,
};

/// Disk-backed cache of model responses.
///
/// One entry per request URL: a body file and a JSON metadata sidecar, both
/// written atomically (temp+rename), metadata last. The store never serves
/// staleness decisions itself — callers read [`StoredEntry::freshness`].
#[derive(Clone, Debug)]
pub struct ModelStore {
    dir: PathBuf,
    expiry: std::time::Duration,
}

impl ModelStore {
    /// Open (or create) the store for the configured namespace.
    ///
    /// Activation cleanup: sibling namespaces of the same cache name but a
    /// different version are deleted here. This is the only eviction
    /// mechanism besides per-entry expiry.
    pub fn open(options: StoreOptions) -> StoreResult<Self> {
        let namespace = options.namespace();
        let dir = options.root_dir.join(&namespace);

        if options.root_dir.exists() {
            Self::delete_stale_namespaces(&options, &namespace)?;
        }
        std::fs::create_dir_all(&dir)?;

        debug!(dir = %dir.display(), "maquette-store: opened namespace");
        Ok(Self {
            dir,
            expiry: options.expiry,
        })
    }

    fn delete_stale_namespaces(options: &StoreOptions, current: &str) -> StoreResult<()> {
        let prefix = format!("{}-v", options.cache_name);
        for dir_entry in std::fs::read_dir(&options.root_dir)? {
            let dir_entry = dir_entry?;
            let name = dir_entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with(&prefix) && name != current && dir_entry.path().is_dir() {
                debug!(stale = name, "maquette-store: deleting old cache namespace");
                std::fs::remove_dir_all(dir_entry.path())?;
            }
        }
        Ok(())
    }

    /// Freshness window this store was opened with.
    #[must_use]
    pub fn expiry(&self) -> std::time::Duration {
        self.expiry
    }

    fn body_path(&self, hash: EntryHash) -> PathBuf {
        self.dir.join(format!("{}.bin", hash.to_hex()))
    }

    fn meta_path(&self, hash: EntryHash) -> PathBuf {
        self.dir.join(format!("{}.meta", hash.to_hex()))
    }

    /// Store a response, stamping it with the current wall clock.
    pub fn put(
        &self,
        url: &Url,
        status: u16,
        status_text: &str,
        headers: &Headers,
        body: &Bytes,
    ) -> StoreResult<()> {
        self.put_at(url, status, status_text, headers, body, now_ms())
    }

    /// Store a response with an explicit stamp time.
    pub fn put_at(
        &self,
        url: &Url,
        status: u16,
        status_text: &str,
        headers: &Headers,
        body: &Bytes,
        cached_at_ms: u64,
    ) -> StoreResult<()> {
        let hash = EntryHash::from_url(url);

        let mut stamped = headers.clone();
        stamped.insert(CACHED_TIME_HEADER, cached_at_ms.to_string());

        let meta = StoredMeta::from_parts(url, status, status_text, &stamped);
        let meta_json = serde_json::to_vec(&meta)?;

        // Body first; the metadata sidecar is the commit marker.
        write_atomic(&self.body_path(hash), body)?;
        write_atomic(&self.meta_path(hash), &meta_json)?;

        trace!(url = %url, bytes = body.len(), "maquette-store: stored entry");
        Ok(())
    }

    /// Read an entry back. `None` for absent or partially-written entries.
    pub fn get(&self, url: &Url) -> StoreResult<Option<StoredEntry>> {
        let hash = EntryHash::from_url(url);
        let meta_path = self.meta_path(hash);
        if !meta_path.exists() {
            return Ok(None);
        }

        let meta: StoredMeta = serde_json::from_slice(&std::fs::read(&meta_path)?)?;
        let body = match std::fs::read(self.body_path(hash)) {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(meta.into_entry(body))
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.meta_path(EntryHash::from_url(url)).exists()
    }

    /// All cached request URLs.
    pub fn keys(&self) -> StoreResult<Vec<Url>> {
        let mut out = Vec::new();
        for dir_entry in std::fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("meta") {
                continue;
            }
            let Ok(raw) = std::fs::read(&path) else { continue };
            match serde_json::from_slice::<StoredMeta>(&raw) {
                Ok(meta) => {
                    if let Ok(url) = Url::parse(&meta.url) {
                        out.push(url);
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "maquette-store: skipping corrupt metadata");
                }
            }
        }
        Ok(out)
    }

    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.keys()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.keys()?.is_empty())
    }
}
