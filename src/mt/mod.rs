//! Machine Translation Module
//!
//! Everything between a set of catalog strings and their translations:
//!
//! 1. **Provider trait** - `MachineTranslator`, with a Google Translate v2
//!    implementation and a deterministic mock
//! 2. **Token protection** - masks `{placeholders}` and `&entities;` so the
//!    provider leaves them alone
//! 3. **Batching** - deduplicates payloads, batches requests, retries and
//!    degrades gracefully when the provider misbehaves
//!
//! # Example
//!
//! ```ignore
//! use catalog_mt::mt::{BatchSettings, BatchTranslator, GoogleTranslateProvider, TokenProtector};
//! use std::collections::BTreeSet;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = GoogleTranslateProvider::from_env()?;
//!     let protector = TokenProtector::with_default_patterns()?;
//!     let batcher = BatchTranslator::new(&provider, &protector, BatchSettings::default());
//!
//!     let strings = BTreeSet::from(["Szia {name}!".to_string()]);
//!     let mapping = batcher.translate_strings(&strings, "hu", "en").await;
//!     println!("{:?}", mapping);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod error;
pub mod google_translate;
pub mod mock;
pub mod protect;
pub mod translator;

pub use batch::{
    BatchSettings, BatchTranslator, PayloadGroup, RetryOutcome, TranslationMode,
    group_by_payload, translate_with_retry,
};
pub use error::{MtError, MtResult};
pub use google_translate::GoogleTranslateProvider;
pub use mock::{BatchFailure, MockMode, MockTranslator};
pub use protect::{MarkerKind, TokenMap, TokenProtector};
pub use translator::MachineTranslator;
