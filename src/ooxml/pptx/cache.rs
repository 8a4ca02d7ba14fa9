//! Read-only template cache shared between builds.
//!
//! Templates are keyed by the SHA-256 of their bytes, so the same file read
//! twice maps to one opened [`Archive`]. Builds borrow the shared archive and
//! work on their own copy; nothing in the cache is ever mutated.

use crate::common::Result;
use crate::ooxml::opc::Archive;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

type TemplateKey = [u8; 32];

/// Opened templates by content hash.
#[derive(Debug, Default)]
pub struct TemplateCache {
    templates: RwLock<HashMap<TemplateKey, Arc<Archive>>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The opened template for `bytes`, opening it on first use.
    ///
    /// A template that fails to open is not cached.
    pub fn get_or_open(&self, bytes: &[u8]) -> Result<Arc<Archive>> {
        let key = Self::key(bytes);
        if let Some(archive) = self.templates.read().get(&key) {
            tracing::trace!("template cache hit");
            return Ok(Arc::clone(archive));
        }

        // Opened outside the lock; a concurrent open of the same bytes keeps
        // whichever archive was stored first.
        let opened = Arc::new(Archive::open(bytes)?);
        let mut templates = self.templates.write();
        let archive = Arc::clone(templates.entry(key).or_insert(opened));
        tracing::debug!(templates = templates.len(), "template cached");
        Ok(archive)
    }

    /// Whether a template with these bytes is cached.
    pub fn contains(&self, bytes: &[u8]) -> bool {
        self.templates.read().contains_key(&Self::key(bytes))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.templates.read().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.templates.read().is_empty()
    }

    pub fn clear(&self) {
        self.templates.write().clear();
    }

    fn key(bytes: &[u8]) -> TemplateKey {
        Sha256::digest(bytes).into()
    }
}
