//! Mock machine translator for tests and offline runs
//!
//! Deterministic, API-free, and able to simulate the failure modes the
//! batching layer has to absorb: failing batch calls, batches that come
//! back short, and items that never translate.
//!
//! # Example
//!
//! ```ignore
//! use catalog_mt::mt::{MachineTranslator, MockMode, MockTranslator};
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockTranslator::new(MockMode::Suffix);
//!     let result = mock.translate("Mentés", "hu", "en").await.unwrap();
//!     assert_eq!(result, "Mentés_en");
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::{MachineTranslator, validate_locale};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// How the mock turns a text into its "translation"
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append locale suffix: "Mentés" → "Mentés_en"
    Suffix,

    /// Uppercase the whole text, markers included
    Uppercase,

    /// Predefined (text, target_locale) → translation, suffix otherwise
    Mappings(HashMap<(String, String), String>),

    /// Every call fails with this message
    Error(String),

    /// Return input unchanged
    NoOp,
}

/// How `translate_batch` misbehaves, if at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchFailure {
    /// The batch call returns an error
    Error,
    /// The batch call returns one translation fewer than requested
    DropLast,
}

/// Mock translator that records what it was asked to do
#[derive(Debug)]
pub struct MockTranslator {
    mode: MockMode,
    /// Optional simulated network delay (in milliseconds)
    delay_ms: u64,
    batch_failure: Option<BatchFailure>,
    /// Texts whose single-item translation always fails
    failing_items: HashSet<String>,
    single_calls: AtomicUsize,
    batches: Mutex<Vec<Vec<String>>>,
}

impl MockTranslator {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            delay_ms: 0,
            batch_failure: None,
            failing_items: HashSet::new(),
            single_calls: AtomicUsize::new(0),
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Add a simulated delay to every call
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Make every batch call misbehave
    pub fn with_batch_failure(mut self, failure: BatchFailure) -> Self {
        self.batch_failure = Some(failure);
        self
    }

    /// Make single-item translation of `text` fail on every attempt
    pub fn failing_on(mut self, text: impl Into<String>) -> Self {
        self.failing_items.insert(text.into());
        self
    }

    /// Number of `translate` calls so far
    pub fn single_calls(&self) -> usize {
        self.single_calls.load(Ordering::SeqCst)
    }

    /// Every batch passed to `translate_batch`, in call order
    pub fn submitted_batches(&self) -> Vec<Vec<String>> {
        self.batches
            .lock()
            .map(|batches| batches.clone())
            .unwrap_or_default()
    }

    async fn apply_delay(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }

    fn apply_translation(&self, text: &str, target: &str) -> MtResult<String> {
        match &self.mode {
            MockMode::Suffix => Ok(format!("{}_{}", text, target)),
            MockMode::Uppercase => Ok(text.to_uppercase()),
            MockMode::Mappings(map) => {
                let key = (text.to_string(), target.to_string());
                Ok(map
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| format!("{}_{}", text, target)))
            }
            MockMode::Error(msg) => Err(MtError::TranslationError(msg.clone())),
            MockMode::NoOp => Ok(text.to_string()),
        }
    }
}

#[async_trait]
impl MachineTranslator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        _source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        validate_locale(target_locale)?;
        self.apply_delay().await;

        if self.failing_items.contains(text) {
            return Err(MtError::NetworkError(format!(
                "simulated failure for '{}'",
                text
            )));
        }
        self.apply_translation(text, target_locale)
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        _source_locale: &str,
        target_locale: &str,
    ) -> MtResult<Vec<String>> {
        if let Ok(mut batches) = self.batches.lock() {
            batches.push(texts.to_vec());
        }
        // Per batch, not per string
        self.apply_delay().await;

        if self.batch_failure == Some(BatchFailure::Error) {
            return Err(MtError::NetworkError("simulated batch failure".to_string()));
        }

        let mut results = texts
            .iter()
            .map(|text| self.apply_translation(text, target_locale))
            .collect::<MtResult<Vec<_>>>()?;

        if self.batch_failure == Some(BatchFailure::DropLast) {
            results.pop();
        }
        Ok(results)
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}
