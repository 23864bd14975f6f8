//! Process-wide cache of parsed templates.
//!
//! In production mode a template is parsed once per cache key, even
//! with concurrent first requests: the map lock is only held to find
//! the key's slot, then the slot's own lock serializes the parse.
//! Other keys stay available meanwhile. A failed parse leaves the slot
//! empty; the next request tries again. In development mode (and for
//! templates without a key) every request reads and parses afresh.

use std::{collections::HashMap,
          sync::{Arc, Mutex, MutexGuard, PoisonError,
                 atomic::{AtomicU64, Ordering}}};

use kstring::KString;
use lazy_static::lazy_static;

use crate::{config::{DeploymentConfiguration, is_production_mode},
            error::Result,
            fragment::ParsedDocument,
            parser::parse_stream,
            stream::StreamProvider,
            time_guard, trace, warn};

lazy_static!{
    static ref GLOBAL: Arc<TemplateCache> = Arc::new(TemplateCache::new());
}

// Parsing never panics while holding one of our locks, but if a
// stream provider does, the data is still consistent.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<T> {
    m.lock().unwrap_or_else(|e: PoisonError<_>| {
        warn!("template cache lock was poisoned, continuing");
        e.into_inner()
    })
}

#[derive(Debug, Default)]
struct CacheSlot {
    document: Mutex<Option<Arc<ParsedDocument>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Requests answered from the cache.
    pub hits: u64,
    /// Requests that parsed and then filled (or tried to fill) a slot.
    pub misses: u64,
    /// Requests that bypassed the cache.
    pub uncached: u64,
}

#[derive(Debug, Default)]
pub struct TemplateCache {
    slots: Mutex<HashMap<KString, Arc<CacheSlot>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    uncached: AtomicU64,
}

/// Reads and parses the template from a fresh stream of `provider`.
/// The stream is dropped before returning, whatever the outcome.
pub fn read_template(provider: &dyn StreamProvider) -> Result<ParsedDocument> {
    time_guard!("read_template");
    let mut stream = provider.create_stream()?;
    parse_stream(&mut *stream)
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared by all engines created with
    /// `TemplateEngine::new`.
    pub fn global() -> Arc<TemplateCache> {
        GLOBAL.clone()
    }

    /// The parsed template for `cache_key`. No config means production
    /// mode. `provider` is only asked for a stream when a parse is
    /// needed.
    pub fn get(
        &self,
        cache_key: Option<&str>,
        config: Option<&DeploymentConfiguration>,
        provider: &dyn StreamProvider,
    ) -> Result<Arc<ParsedDocument>> {
        let key = match cache_key {
            Some(key) if is_production_mode(config) => key,
            _ => {
                trace!("reading template {cache_key:?} uncached");
                self.uncached.fetch_add(1, Ordering::Relaxed);
                return Ok(Arc::new(read_template(provider)?))
            }
        };

        let slot = lock(&self.slots)
            .entry(KString::from_ref(key))
            .or_default()
            .clone();
        let mut document = lock(&slot.document);
        if let Some(document) = &*document {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(document.clone())
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!("parsing template {key:?}");
        let parsed = Arc::new(read_template(provider)?);
        *document = Some(parsed.clone());
        Ok(parsed)
    }

    /// Whether a parsed template is stored for `cache_key`.
    pub fn contains(&self, cache_key: &str) -> bool {
        let slot = lock(&self.slots).get(cache_key).cloned();
        match slot {
            Some(slot) => lock(&slot.document).is_some(),
            None => false
        }
    }

    /// Number of stored templates.
    pub fn len(&self) -> usize {
        let slots: Vec<Arc<CacheSlot>> = lock(&self.slots).values().cloned().collect();
        slots.iter().filter(|slot| lock(&slot.document).is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            uncached: self.uncached.load(Ordering::Relaxed),
        }
    }
}
