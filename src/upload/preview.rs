//! Revocable local preview references
//!
//! A preview is the terminal equivalent of a browser object URL: a
//! `blob:describo/<uuid>` reference registered in a [`PreviewStore`] that must
//! be released exactly once. [`PreviewHandle`] owns the registration; it is
//! released by [`PreviewHandle::revoke`] or, failing that, on drop.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const PREVIEW_SCHEME: &str = "blob:describo/";

/// What a preview reference resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewEntry {
    /// File name of the previewed image
    pub name: String,
    /// Declared MIME type
    pub mime_type: String,
    /// Size in bytes
    pub size: u64,
    /// Pixel dimensions when the header could be read
    pub dimensions: Option<(u32, u32)>,
}

#[derive(Debug, Default)]
struct StoreInner {
    live: HashMap<Uuid, PreviewEntry>,
    created: u64,
    released: u64,
}

/// Registry of live preview references
///
/// Cloning shares the registry.
#[derive(Debug, Clone, Default)]
pub struct PreviewStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl PreviewStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a preview and hand out its owning handle
    pub fn create(&self, entry: PreviewEntry) -> PreviewHandle {
        let id = Uuid::new_v4();
        if let Ok(mut inner) = self.inner.lock() {
            inner.live.insert(id, entry);
            inner.created += 1;
        }
        tracing::debug!("Created preview {}{}", PREVIEW_SCHEME, id);

        PreviewHandle {
            id,
            url: format!("{}{}", PREVIEW_SCHEME, id),
            store: self.clone(),
            released: false,
        }
    }

    /// Look up a live preview by its reference
    pub fn resolve(&self, url: &str) -> Option<PreviewEntry> {
        let id = Uuid::parse_str(url.strip_prefix(PREVIEW_SCHEME)?).ok()?;
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.live.get(&id).cloned())
    }

    /// Number of previews not yet released
    pub fn live_count(&self) -> usize {
        self.inner.lock().map(|i| i.live.len()).unwrap_or_default()
    }

    /// Number of previews ever created
    pub fn created_count(&self) -> u64 {
        self.inner.lock().map(|i| i.created).unwrap_or_default()
    }

    /// Number of releases performed
    pub fn released_count(&self) -> u64 {
        self.inner.lock().map(|i| i.released).unwrap_or_default()
    }

    fn release(&self, id: &Uuid) {
        if let Ok(mut inner) = self.inner.lock() {
            if inner.live.remove(id).is_some() {
                inner.released += 1;
                tracing::debug!("Released preview {}{}", PREVIEW_SCHEME, id);
            }
        }
    }
}

/// Exclusive owner of one preview registration
#[derive(Debug)]
pub struct PreviewHandle {
    id: Uuid,
    url: String,
    store: PreviewStore,
    released: bool,
}

impl PreviewHandle {
    /// The displayable reference
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Release the preview now
    pub fn revoke(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.store.release(&self.id);
        }
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.release_once();
    }
}
