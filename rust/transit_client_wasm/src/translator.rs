use std::cell::RefCell;
use std::rc::Rc;

use futures::future::join_all;
use log::{debug, info, warn};

use crate::cache::TranslationCache;
use crate::config::TranslatorConfig;
use crate::service::TranslationProvider;
use crate::session::Session;
use crate::storage::KeyValueStore;

/// Fail-open, cached translation of UI strings.
///
/// Never returns an error: whenever the provider cannot produce a
/// translation the original text comes back unchanged and nothing is cached,
/// so the next call for the same key asks the provider again.
///
/// Concurrent calls for the same uncached key are not coalesced; each one
/// reaches the provider and the last result written wins.
pub struct Translator {
    provider: Box<dyn TranslationProvider>,
    cache: RefCell<TranslationCache>,
    session: Session,
    source_lang: String,
    active_lang: RefCell<String>,
}

impl Translator {
    pub fn new(
        config: &TranslatorConfig,
        provider: Box<dyn TranslationProvider>,
        store: Rc<dyn KeyValueStore>,
    ) -> Self {
        let cache = TranslationCache::load(store.clone(), &config.storage_key);
        let session = Session::new(store);
        let active_lang = session
            .language()
            .unwrap_or_else(|| config.target_lang.clone());
        info!(
            "translator ready: provider={} source={} active={} cached={}",
            provider.service_name(),
            config.source_lang,
            active_lang,
            cache.len()
        );
        Self {
            provider,
            cache: RefCell::new(cache),
            session,
            source_lang: config.source_lang.clone(),
            active_lang: RefCell::new(active_lang),
        }
    }

    pub fn source_language(&self) -> &str {
        &self.source_lang
    }

    pub fn language(&self) -> String {
        self.active_lang.borrow().clone()
    }

    /// Cached entries stay valid: they are keyed by language.
    pub fn set_language(&self, code: &str) {
        *self.active_lang.borrow_mut() = code.to_string();
        if let Err(err) = self.session.set_language(code) {
            warn!("active language not persisted: {}", err);
        }
    }

    pub async fn translate_active(&self, text: &str) -> String {
        let target_lang = self.language();
        self.translate(text, &target_lang).await
    }

    pub async fn translate(&self, text: &str, target_lang: &str) -> String {
        if target_lang.eq_ignore_ascii_case(&self.source_lang) || text.trim().is_empty() {
            return text.to_string();
        }
        if let Some(hit) = self.cached(text, target_lang) {
            return hit;
        }

        // No cache borrow is held across the request.
        match self
            .provider
            .translate(text, &self.source_lang, target_lang)
            .await
        {
            Ok(translated) => {
                debug!("translated {:?} -> {:?} [{}]", text, translated, target_lang);
                self.cache
                    .borrow_mut()
                    .insert(text, target_lang, translated.clone());
                translated
            }
            Err(err) => {
                warn!(
                    "{} translation to {} failed, keeping original: {}",
                    self.provider.service_name(),
                    target_lang,
                    err
                );
                text.to_string()
            }
        }
    }

    /// One independent request per element; results keep input order.
    pub async fn translate_batch(&self, texts: &[String], target_lang: &str) -> Vec<String> {
        join_all(texts.iter().map(|text| self.translate(text, target_lang))).await
    }

    pub fn cached(&self, text: &str, target_lang: &str) -> Option<String> {
        self.cache
            .borrow()
            .get(text, target_lang)
            .map(str::to_string)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }
}
