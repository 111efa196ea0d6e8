//! Provider abstraction for machine translation
//!
//! The pipeline only talks to `MachineTranslator`, so the Google provider,
//! the mock used in tests, or any other backend can be swapped in without
//! touching batching or catalog code.
//!
//! # Example
//!
//! ```ignore
//! use catalog_mt::mt::{GoogleTranslateProvider, MachineTranslator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = GoogleTranslateProvider::from_env()?;
//!     let result = provider.translate("Mentés", "hu", "en").await?;
//!     println!("{}", result); // "Save"
//!     Ok(())
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use async_trait::async_trait;

/// Generic trait for machine translation providers
///
/// Calls may fail transiently; callers are expected to retry or degrade
/// rather than abort (see [`crate::mt::batch`]).
#[async_trait]
pub trait MachineTranslator: Send + Sync {
    /// Translate a single text string from source to target locale
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String>;

    /// Translate multiple strings in one request
    ///
    /// # Guarantees
    ///
    /// Implementations should return one output per input, in input order.
    /// Callers still verify the length, since remote services do not always
    /// keep this promise.
    async fn translate_batch(
        &self,
        texts: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<Vec<String>>;

    /// Name used in log lines
    fn provider_name(&self) -> &str;
}

/// Normalize a locale code by stripping region information
///
/// - `en-US` → `en`
/// - `de-AT` → `de`
/// - `hu` → `hu`
pub fn normalize_locale(locale: &str) -> String {
    locale.split('-').next().unwrap_or(locale).to_lowercase()
}

/// Validate that a locale code only contains ASCII alphanumerics, `-` and `_`
pub fn validate_locale(locale: &str) -> MtResult<()> {
    if locale.is_empty() {
        return Err(MtError::InvalidLocale("Locale code is empty".to_string()));
    }

    if !locale
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(MtError::InvalidLocale(format!(
            "Invalid characters in locale code: {}",
            locale
        )));
    }

    Ok(())
}
