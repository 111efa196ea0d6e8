use catalog_mt::mt::{
    GoogleTranslateProvider, MachineTranslator, MockMode, MockTranslator, TranslationMode,
};
use catalog_mt::{MtError, MtResult, Pipeline, PipelineConfig};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("catalog-mt")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Machine-translate a JSON message catalog into other languages")
        .arg(
            Arg::new("messages-dir")
                .long("messages-dir")
                .short('d')
                .value_parser(value_parser!(PathBuf))
                .help("Directory holding <locale>.json catalogs (default: messages)"),
        )
        .arg(
            Arg::new("source")
                .long("source")
                .short('s')
                .help("Source language code (default: hu)"),
        )
        .arg(
            Arg::new("targets")
                .long("targets")
                .short('t')
                .value_delimiter(',')
                .help("Comma separated target language codes (default: en,de)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_parser(value_parser!(PathBuf))
                .help("JSON config file; flags override its values"),
        )
        .arg(
            Arg::new("batch-size")
                .long("batch-size")
                .value_parser(value_parser!(usize))
                .help("Strings per batch request (default: 25)"),
        )
        .arg(
            Arg::new("retries")
                .long("retries")
                .value_parser(value_parser!(u32))
                .help("Attempts per string when a batch fails (default: 3)"),
        )
        .arg(
            Arg::new("retry-delay-ms")
                .long("retry-delay-ms")
                .value_parser(value_parser!(u64))
                .help("Pause between attempts in milliseconds"),
        )
        .arg(
            Arg::new("per-item")
                .long("per-item")
                .help("Translate one string per request instead of batching")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use a no-op mock translator instead of Google Translate")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log every request and retry")
                .action(ArgAction::SetTrue),
        )
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();
}

/// Defaults, then the config file, then flags
fn build_config(matches: &ArgMatches) -> MtResult<PipelineConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(source) = matches.get_one::<String>("source") {
        config = config.with_source_locale(source);
    }
    // Only an explicit directory moves the targets
    if let Some(dir) = matches.get_one::<PathBuf>("messages-dir") {
        config = config.with_messages_dir(dir);
    }
    if let Some(targets) = matches.get_many::<String>("targets") {
        let locales: Vec<&str> = targets.map(|t| t.trim()).filter(|t| !t.is_empty()).collect();
        config = config.with_target_locales(locales.as_slice());
    }

    if let Some(&batch_size) = matches.get_one::<usize>("batch-size") {
        config.batch_size = batch_size;
    }
    if let Some(&retries) = matches.get_one::<u32>("retries") {
        config.max_attempts = retries;
    }
    if let Some(&delay) = matches.get_one::<u64>("retry-delay-ms") {
        config.retry_delay_ms = Some(delay);
    }
    if matches.get_flag("per-item") {
        config.mode = TranslationMode::PerItem;
    }

    config.validate()?;
    Ok(config)
}

fn build_translator(use_mock: bool) -> MtResult<Box<dyn MachineTranslator>> {
    if use_mock {
        return Ok(Box::new(MockTranslator::new(MockMode::NoOp)));
    }
    Ok(Box::new(GoogleTranslateProvider::from_env()?))
}

async fn run(matches: &ArgMatches) -> MtResult<()> {
    let config = build_config(matches)?;
    // No catalog is read and no request is sent without a provider
    let translator = build_translator(matches.get_flag("mock"))?;

    let summary = Pipeline::new(config, translator.as_ref()).run().await?;
    for (locale, path) in &summary.outputs {
        println!("{}: {}", locale, path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    match run(&matches).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let MtError::MissingCapability(msg) = &e {
                eprintln!("MISSING_DEPENDENCY: {}", msg);
                eprintln!("   Set it with: export GOOGLE_TRANSLATE_API_KEY=your_api_key");
                eprintln!("   Or use --mock to run without a translation service");
            } else {
                error!("{}", e);
            }
            ExitCode::from(e.exit_code())
        }
    }
}
