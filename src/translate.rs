//! Session-scoped translation cache
//!
//! Display strings (insight sentences, labels) are authored in English and
//! translated on demand. The cache is an explicit object owned by the
//! caller's session, keyed by target language and source text, without
//! eviction.

use std::collections::HashMap;
use tracing::warn;

/// Source language of every display string
pub const SOURCE_LANGUAGE: &str = "en";

/// Machine translation backend
pub trait Translator {
    /// Translate `texts` from English into `target`, preserving order
    fn translate(&self, texts: &[String], target: &str) -> Result<Vec<String>, TranslateError>;
}

/// Translation backend failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    #[error("Translation request failed: {0}")]
    Request(String),

    #[error("Translation response had {actual} items, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Memoized translations for one session
#[derive(Debug, Clone, Default)]
pub struct TranslationCache {
    by_language: HashMap<String, HashMap<String, String>>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate a batch, sending only uncached texts to the backend.
    ///
    /// English targets and a missing backend return the input unchanged.
    /// Backend failures fall back to the English text and leave the cache
    /// untouched so a later call can retry.
    pub fn translate_batch(
        &mut self,
        translator: Option<&dyn Translator>,
        texts: &[String],
        target: &str,
    ) -> HashMap<String, String> {
        let Some(translator) = translator.filter(|_| target != SOURCE_LANGUAGE) else {
            return texts.iter().map(|t| (t.clone(), t.clone())).collect();
        };
        if texts.is_empty() {
            return HashMap::new();
        }

        let language_cache = self.by_language.entry(target.to_string()).or_default();

        let mut uncached: Vec<String> = Vec::new();
        for text in texts {
            if !language_cache.contains_key(text) && !uncached.contains(text) {
                uncached.push(text.clone());
            }
        }

        if !uncached.is_empty() {
            match translator.translate(&uncached, target) {
                Ok(translated) if translated.len() == uncached.len() => {
                    for (source, result) in uncached.into_iter().zip(translated) {
                        language_cache.insert(source, result);
                    }
                }
                Ok(translated) => {
                    let error = TranslateError::LengthMismatch {
                        expected: uncached.len(),
                        actual: translated.len(),
                    };
                    warn!(target_language = target, error = %error, "falling back to English");
                }
                Err(error) => {
                    warn!(target_language = target, error = %error, "falling back to English");
                }
            }
        }

        texts
            .iter()
            .map(|t| {
                let shown = language_cache.get(t).cloned().unwrap_or_else(|| t.clone());
                (t.clone(), shown)
            })
            .collect()
    }

    /// Translate a single string through the cache
    pub fn translate(
        &mut self,
        translator: Option<&dyn Translator>,
        text: &str,
        target: &str,
    ) -> String {
        let texts = [text.to_string()];
        self.translate_batch(translator, &texts, target)
            .remove(text)
            .unwrap_or_else(|| text.to_string())
    }

    /// Cached translation, if one exists
    pub fn get_cached(&self, text: &str, target: &str) -> Option<&str> {
        self.by_language
            .get(target)
            .and_then(|cache| cache.get(text))
            .map(String::as_str)
    }

    /// Number of cached translations across all languages
    pub fn len(&self) -> usize {
        self.by_language.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
