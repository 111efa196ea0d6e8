//! Machine translation for nested JSON message catalogs
//!
//! Translates every string in a catalog (Hungarian by default) into one or
//! more target languages through a [`mt::MachineTranslator`], keeping
//! `{placeholders}` and `&entities;` intact and the catalog's shape
//! unchanged.
//!
//! # Workflow Example
//!
//! ```ignore
//! use catalog_mt::{Pipeline, PipelineConfig};
//! use catalog_mt::mt::GoogleTranslateProvider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = GoogleTranslateProvider::from_env()?;
//!     let summary = Pipeline::new(PipelineConfig::default(), &provider).run().await?;
//!     println!("{} unique strings, wrote {:?}", summary.unique_strings, summary.outputs);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod mt;
pub mod pipeline;


pub use catalog::Catalog;
pub use config::{PipelineConfig, TargetLanguage};
pub use mt::{MtError, MtResult};
pub use pipeline::{Pipeline, RunSummary};
