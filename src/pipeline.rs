//! End-to-end catalog translation
//!
//! Load the source catalog, collect its unique strings once, then for each
//! target language build a translation mapping, rewrite the catalog and
//! write it out. Languages are handled one after another; a language's file
//! is only written once its mapping is complete and its key paths match the
//! source.

use crate::catalog::Catalog;
use crate::config::PipelineConfig;
use crate::mt::batch::BatchTranslator;
use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::MachineTranslator;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::info;

/// What a finished run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub unique_strings: usize,
    /// (locale, output path) in the order written
    pub outputs: Vec<(String, PathBuf)>,
}

pub struct Pipeline<'a> {
    config: PipelineConfig,
    translator: &'a dyn MachineTranslator,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: PipelineConfig, translator: &'a dyn MachineTranslator) -> Self {
        Self { config, translator }
    }

    /// Translate `catalog` into one target locale without touching disk
    pub async fn translate_catalog(
        &self,
        catalog: &Catalog,
        target_locale: &str,
    ) -> MtResult<Catalog> {
        let protector = self.config.protector()?;
        let batcher =
            BatchTranslator::new(self.translator, &protector, self.config.batch_settings());
        let mapping = batcher
            .translate_strings(
                &catalog.collect_strings(),
                &self.config.source_locale,
                target_locale,
            )
            .await;
        Ok(catalog.apply_translation(&mapping))
    }

    /// Run every configured target language and write the results
    ///
    /// # Errors
    /// Only structural failures end a run: invalid configuration, a missing
    /// or unparsable source catalog, an output whose key paths differ from
    /// the source, or a failed write. Provider failures
    /// are absorbed while building each mapping.
    pub async fn run(&self) -> MtResult<RunSummary> {
        self.config.validate()?;
        let protector = self.config.protector()?;

        let source = Catalog::load(&self.config.source_path)?;
        let unique = source.collect_strings();
        let source_keys = source.key_paths();
        info!(
            "Found {} unique {} strings",
            unique.len(),
            self.config.source_locale.to_uppercase()
        );

        let batcher =
            BatchTranslator::new(self.translator, &protector, self.config.batch_settings());
        let mut outputs = Vec::with_capacity(self.config.targets.len());

        for target in &self.config.targets {
            let mapping = batcher
                .translate_strings(&unique, &self.config.source_locale, &target.locale)
                .await;
            let translated = source.apply_translation(&mapping);
            check_key_parity(
                &source_keys,
                &self.config.source_locale,
                &translated,
                &target.locale,
            )?;
            translated.save(&target.output_path)?;
            info!("Wrote: {}", target.output_path.display());
            outputs.push((target.locale.clone(), target.output_path.clone()));
        }

        Ok(RunSummary {
            unique_strings: unique.len(),
            outputs,
        })
    }
}

/// Fail unless `translated` has exactly the source's key paths
fn check_key_parity(
    source_keys: &BTreeSet<String>,
    source_locale: &str,
    translated: &Catalog,
    target_locale: &str,
) -> MtResult<()> {
    let keys = translated.key_paths();
    info!(
        "{} keys: {}, {} keys: {}",
        source_locale,
        source_keys.len(),
        target_locale,
        keys.len()
    );

    if &keys != source_keys {
        return Err(MtError::StructureMismatch(format!(
            "'{}' output has {} missing and {} unexpected key paths",
            target_locale,
            source_keys.difference(&keys).count(),
            keys.difference(source_keys).count()
        )));
    }
    Ok(())
}
