//! Batched translation with retry and graceful degradation
//!
//! Turns a set of catalog strings into a complete translation mapping:
//!
//! 1. Empty strings map to themselves and never reach the provider.
//! 2. Every other string is protected (see [`crate::mt::protect`]) and
//!    strings that mask to the same payload share one request slot.
//! 3. Payloads are sent in fixed-size batches. A batch that errors or comes
//!    back with the wrong number of items is redone one item at a time,
//!    each item getting a bounded number of attempts.
//! 4. An item that exhausts its attempts keeps its payload as its
//!    translation, so the mapping is always total.
//!
//! All requests are awaited one after another; nothing runs concurrently.

use crate::mt::error::{MtError, MtResult};
use crate::mt::protect::{TokenMap, TokenProtector};
use crate::mt::translator::MachineTranslator;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Whether payloads go out in batches or one by one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TranslationMode {
    /// Batch requests with per-item fallback
    #[default]
    Batched,
    /// One request per payload, each with retries
    PerItem,
}

/// Tuning for [`BatchTranslator`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSettings {
    pub mode: TranslationMode,
    /// Payloads per batch request
    pub batch_size: usize,
    /// Attempts per item in the single-item path
    pub max_attempts: u32,
    /// Pause between failed attempts
    pub retry_delay: Duration,
    /// Log progress every N batches (batched) or N items (per-item)
    pub progress_every: usize,
}

impl BatchSettings {
    pub const DEFAULT_BATCH_SIZE: usize = 25;
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// Defaults for one-request-per-string runs
    pub fn per_item() -> Self {
        Self {
            mode: TranslationMode::PerItem,
            retry_delay: Duration::from_millis(400),
            progress_every: 150,
            ..Self::default()
        }
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            mode: TranslationMode::Batched,
            batch_size: Self::DEFAULT_BATCH_SIZE,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            retry_delay: Duration::from_millis(500),
            progress_every: 10,
        }
    }
}

/// Result of a bounded retry loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    Translated(String),
    Exhausted { attempts: u32, last_error: MtError },
}

impl RetryOutcome {
    /// The translation, or `fallback` if every attempt failed
    pub fn or_fallback(self, fallback: &str) -> String {
        match self {
            RetryOutcome::Translated(text) => text,
            RetryOutcome::Exhausted { .. } => fallback.to_string(),
        }
    }
}

/// Translate one text, trying up to `max_attempts` times
///
/// Sleeps `delay` between attempts, not after the last one. A zero
/// `max_attempts` is treated as one. Errors that cannot clear up on their
/// own (see [`MtError::is_transient`]) end the loop at once.
pub async fn translate_with_retry(
    translator: &dyn MachineTranslator,
    text: &str,
    source_locale: &str,
    target_locale: &str,
    max_attempts: u32,
    delay: Duration,
) -> RetryOutcome {
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match translator.translate(text, source_locale, target_locale).await {
            Ok(translated) => return RetryOutcome::Translated(translated),
            Err(e) if attempt >= max_attempts || !e.is_transient() => {
                return RetryOutcome::Exhausted {
                    attempts: attempt,
                    last_error: e,
                };
            }
            Err(e) => {
                debug!(attempt, error = %e, "translation attempt failed, retrying");
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
        }
    }
}

/// One distinct payload and every original string that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadGroup {
    pub payload: String,
    pub originals: Vec<(String, TokenMap)>,
}

impl PayloadGroup {
    /// Record `translated` for every original sharing this payload
    fn fill(&self, translated: &str, mapping: &mut HashMap<String, String>) {
        for (original, tokens) in &self.originals {
            mapping.insert(original.clone(), tokens.restore(translated));
        }
    }
}

/// Protect `strings` and group them by payload, keeping first-seen order
pub fn group_by_payload<'s>(
    protector: &TokenProtector,
    strings: impl IntoIterator<Item = &'s str>,
) -> Vec<PayloadGroup> {
    let mut groups: Vec<PayloadGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for original in strings {
        let (payload, tokens) = protector.protect(original);
        match index.get(&payload).copied() {
            Some(i) => groups[i].originals.push((original.to_string(), tokens)),
            None => {
                index.insert(payload.clone(), groups.len());
                groups.push(PayloadGroup {
                    payload,
                    originals: vec![(original.to_string(), tokens)],
                });
            }
        }
    }
    groups
}

/// Builds translation mappings through a [`MachineTranslator`]
pub struct BatchTranslator<'a> {
    translator: &'a dyn MachineTranslator,
    protector: &'a TokenProtector,
    settings: BatchSettings,
}

impl<'a> BatchTranslator<'a> {
    pub fn new(
        translator: &'a dyn MachineTranslator,
        protector: &'a TokenProtector,
        settings: BatchSettings,
    ) -> Self {
        Self {
            translator,
            protector,
            settings,
        }
    }

    /// Translate every string in `strings` into `target_locale`
    ///
    /// The returned mapping has an entry for every input string. Provider
    /// failures are absorbed; this never fails.
    pub async fn translate_strings(
        &self,
        strings: &BTreeSet<String>,
        source_locale: &str,
        target_locale: &str,
    ) -> HashMap<String, String> {
        let mut mapping = HashMap::with_capacity(strings.len());
        if strings.contains("") {
            mapping.insert(String::new(), String::new());
        }

        let groups = group_by_payload(
            self.protector,
            strings.iter().map(String::as_str).filter(|s| !s.is_empty()),
        );
        let total = groups.len();
        info!(
            "[{}] translating {} payloads for {} strings via {}",
            target_locale,
            total,
            strings.len(),
            self.translator.provider_name()
        );

        let progress_every = self.settings.progress_every.max(1);
        match self.settings.mode {
            TranslationMode::Batched => {
                let batch_size = self.settings.batch_size.max(1);
                for (batch_index, batch) in groups.chunks(batch_size).enumerate() {
                    let translated = self
                        .translate_chunk(batch, source_locale, target_locale)
                        .await;
                    for (group, text) in batch.iter().zip(&translated) {
                        group.fill(text, &mut mapping);
                    }

                    let done = batch_index + 1;
                    if done % progress_every == 0 {
                        info!(
                            "[{}] translated {}/{}",
                            target_locale,
                            (done * batch_size).min(total),
                            total
                        );
                    }
                }
            }
            TranslationMode::PerItem => {
                for (i, group) in groups.iter().enumerate() {
                    let translated = self
                        .translate_one(&group.payload, source_locale, target_locale)
                        .await;
                    group.fill(&translated, &mut mapping);

                    if (i + 1) % progress_every == 0 {
                        info!("[{}] {}/{}", target_locale, i + 1, total);
                    }
                }
            }
        }

        mapping
    }

    /// Translate one batch, falling back to single requests if needed
    ///
    /// Always returns exactly one string per group.
    async fn translate_chunk(
        &self,
        batch: &[PayloadGroup],
        source_locale: &str,
        target_locale: &str,
    ) -> Vec<String> {
        let payloads: Vec<String> = batch.iter().map(|g| g.payload.clone()).collect();

        match self
            .request_batch(&payloads, source_locale, target_locale)
            .await
        {
            Ok(translated) => translated,
            Err(e) => {
                warn!(
                    "[{}] batch of {} failed ({}), translating items one by one",
                    target_locale,
                    payloads.len(),
                    e
                );
                let mut translated = Vec::with_capacity(payloads.len());
                for payload in &payloads {
                    translated.push(
                        self.translate_one(payload, source_locale, target_locale)
                            .await,
                    );
                }
                translated
            }
        }
    }

    async fn request_batch(
        &self,
        payloads: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<Vec<String>> {
        let translated = self
            .translator
            .translate_batch(payloads, source_locale, target_locale)
            .await?;

        if translated.len() != payloads.len() {
            return Err(MtError::BatchShapeMismatch {
                expected: payloads.len(),
                actual: translated.len(),
            });
        }
        Ok(translated)
    }

    async fn translate_one(
        &self,
        payload: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> String {
        let outcome = translate_with_retry(
            self.translator,
            payload,
            source_locale,
            target_locale,
            self.settings.max_attempts,
            self.settings.retry_delay,
        )
        .await;

        if let RetryOutcome::Exhausted {
            attempts,
            last_error,
        } = &outcome
        {
            warn!(
                "[{}] giving up after {} attempts, keeping source text: {}",
                target_locale, attempts, last_error
            );
        }
        outcome.or_fallback(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt::mock::{BatchFailure, MockMode, MockTranslator};

    fn protector() -> TokenProtector {
        TokenProtector::with_default_patterns().unwrap()
    }

    fn fast_settings() -> BatchSettings {
        BatchSettings {
            retry_delay: Duration::ZERO,
            ..BatchSettings::default()
        }
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_group_by_payload_merges_shared_payloads() {
        let groups = group_by_payload(&protector(), ["Szia {name}", "Szia {user}", "Mentés"]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].payload, "Szia __PH_0__");
        assert_eq!(groups[0].originals.len(), 2);
        assert_eq!(groups[0].originals[0].0, "Szia {name}");
        assert_eq!(groups[0].originals[1].0, "Szia {user}");
        assert_eq!(groups[1].payload, "Mentés");
    }

    #[test]
    fn test_default_settings() {
        let settings = BatchSettings::default();
        assert_eq!(settings.batch_size, 25);
        assert_eq!(settings.max_attempts, 3);
        assert_eq!(settings.retry_delay, Duration::from_millis(500));

        let per_item = BatchSettings::per_item();
        assert_eq!(per_item.mode, TranslationMode::PerItem);
        assert_eq!(per_item.retry_delay, Duration::from_millis(400));
        assert_eq!(per_item.progress_every, 150);
    }

    #[tokio::test]
    async fn test_retry_succeeds_first_try() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let outcome = translate_with_retry(&mock, "Mentés", "hu", "en", 3, Duration::ZERO).await;
        assert_eq!(outcome, RetryOutcome::Translated("Mentés_en".to_string()));
        assert_eq!(mock.single_calls(), 1);
    }

    #[tokio::test]
    async fn test_retry_exhausted() {
        let mock = MockTranslator::new(MockMode::Suffix).failing_on("rossz");
        let outcome = translate_with_retry(&mock, "rossz", "hu", "en", 3, Duration::ZERO).await;
        match &outcome {
            RetryOutcome::Exhausted { attempts, .. } => assert_eq!(*attempts, 3),
            _ => panic!("Expected Exhausted"),
        }
        assert_eq!(mock.single_calls(), 3);
        assert_eq!(outcome.or_fallback("rossz"), "rossz");
    }

    #[tokio::test]
    async fn test_retry_stops_on_permanent_error() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let outcome = translate_with_retry(&mock, "x", "hu", "e n", 3, Duration::ZERO).await;
        match outcome {
            RetryOutcome::Exhausted {
                attempts,
                last_error: MtError::InvalidLocale(_),
            } => assert_eq!(attempts, 1),
            other => panic!("Expected InvalidLocale after one attempt, got {:?}", other),
        }
        assert_eq!(mock.single_calls(), 1);
    }

    #[tokio::test]
    async fn test_retry_zero_attempts_still_tries_once() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let outcome = translate_with_retry(&mock, "a", "hu", "en", 0, Duration::ZERO).await;
        assert_eq!(outcome, RetryOutcome::Translated("a_en".to_string()));
    }

    #[tokio::test]
    async fn test_retry_sleeps_between_attempts() {
        let mock = MockTranslator::new(MockMode::Suffix).failing_on("x");
        let start = std::time::Instant::now();
        let _ = translate_with_retry(&mock, "x", "hu", "en", 3, Duration::from_millis(20)).await;
        // Two pauses for three attempts
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_mapping_is_total_and_restores_tokens() {
        let mock = MockTranslator::new(MockMode::Uppercase);
        let protector = protector();
        let batcher = BatchTranslator::new(&mock, &protector, fast_settings());
        let strings = set(&["Hello {name}", "Bye &amp;", "", "plain"]);

        let mapping = batcher.translate_strings(&strings, "hu", "en").await;

        assert_eq!(mapping.len(), strings.len());
        for s in &strings {
            assert!(mapping.contains_key(s), "missing entry for {:?}", s);
        }
        assert_eq!(mapping["Hello {name}"], "HELLO {name}");
        assert_eq!(mapping["Bye &amp;"], "BYE &amp;");
        assert_eq!(mapping[""], "");
        assert_eq!(mapping["plain"], "PLAIN");
    }

    #[tokio::test]
    async fn test_payloads_sent_once_in_sorted_batches() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let protector = protector();
        let settings = BatchSettings {
            batch_size: 2,
            ..fast_settings()
        };
        let batcher = BatchTranslator::new(&mock, &protector, settings);
        let strings = set(&["c", "a {x}", "a {y}", "b", ""]);

        let mapping = batcher.translate_strings(&strings, "hu", "de").await;

        assert_eq!(
            mock.submitted_batches(),
            vec![
                vec!["a __PH_0__".to_string(), "b".to_string()],
                vec!["c".to_string()],
            ]
        );
        assert_eq!(mapping["a {x}"], "a {x}_de");
        assert_eq!(mapping["a {y}"], "a {y}_de");
        assert_eq!(mock.single_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_batch_falls_back_to_single_requests() {
        let mock = MockTranslator::new(MockMode::Suffix).with_batch_failure(BatchFailure::Error);
        let protector = protector();
        let batcher = BatchTranslator::new(&mock, &protector, fast_settings());
        let strings = set(&["egy", "kettő {n}"]);

        let mapping = batcher.translate_strings(&strings, "hu", "en").await;

        assert_eq!(mapping["egy"], "egy_en");
        assert_eq!(mapping["kettő {n}"], "kettő {n}_en");
        assert_eq!(mock.single_calls(), 2);
    }

    #[tokio::test]
    async fn test_short_batch_falls_back_to_single_requests() {
        let mock =
            MockTranslator::new(MockMode::Suffix).with_batch_failure(BatchFailure::DropLast);
        let protector = protector();
        let batcher = BatchTranslator::new(&mock, &protector, fast_settings());
        let strings = set(&["egy", "kettő", "három"]);

        let mapping = batcher.translate_strings(&strings, "hu", "en").await;

        assert_eq!(mapping["három"], "három_en");
        assert_eq!(mapping.len(), 3);
        assert_eq!(mock.single_calls(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_item_keeps_payload() {
        let mock = MockTranslator::new(MockMode::Suffix)
            .with_batch_failure(BatchFailure::Error)
            .failing_on("Hiba __PH_0__");
        let protector = protector();
        let batcher = BatchTranslator::new(&mock, &protector, fast_settings());
        let strings = set(&["Hiba {code}", "Rendben"]);

        let mapping = batcher.translate_strings(&strings, "hu", "en").await;

        // Payload comes back untranslated, tokens still restored
        assert_eq!(mapping["Hiba {code}"], "Hiba {code}");
        assert_eq!(mapping["Rendben"], "Rendben_en");
        // 3 attempts for the failing item, 1 for the other
        assert_eq!(mock.single_calls(), 4);
    }

    #[tokio::test]
    async fn test_provider_down_degrades_to_identity() {
        let mock = MockTranslator::new(MockMode::Error("down".to_string()));
        let protector = protector();
        let batcher = BatchTranslator::new(&mock, &protector, fast_settings());
        let strings = set(&["Mentés", "{n} elem &amp; több"]);

        let mapping = batcher.translate_strings(&strings, "hu", "en").await;

        for s in &strings {
            assert_eq!(&mapping[s], s);
        }
    }

    #[tokio::test]
    async fn test_per_item_mode_skips_batches() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let protector = protector();
        let settings = BatchSettings {
            retry_delay: Duration::ZERO,
            ..BatchSettings::per_item()
        };
        let batcher = BatchTranslator::new(&mock, &protector, settings);
        let strings = set(&["egy", "kettő", ""]);

        let mapping = batcher.translate_strings(&strings, "hu", "de").await;

        assert!(mock.submitted_batches().is_empty());
        assert_eq!(mock.single_calls(), 2);
        assert_eq!(mapping["kettő"], "kettő_de");
        assert_eq!(mapping[""], "");
    }

    #[tokio::test]
    async fn test_empty_input() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let protector = protector();
        let batcher = BatchTranslator::new(&mock, &protector, fast_settings());

        let mapping = batcher.translate_strings(&BTreeSet::new(), "hu", "en").await;

        assert!(mapping.is_empty());
        assert!(mock.submitted_batches().is_empty());
    }
}
