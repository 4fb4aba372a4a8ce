//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use crammese_bundles::{GameInstall, InstallLayout};
use crammese_core::{
    BuildConfig, MergeConfig, ModuleDiagnostic, ModuleOutcome, ProgressReporter,
    build_knowledge_base, ensure_pack_metadata, merge_translations, write_language_file,
};
use crammese_lexicon::{KaikkiClient, LexiconOptions};
use crammese_shared::{
    AppConfig, LanguageVariant, config_file_path, init_config_at, load_config, load_config_from,
};
use crammese_storage::{KnowledgeStore, database_path, load_if_present};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Crammese: bilingual resource packs for language learners.
#[derive(Parser)]
#[command(
    name = "crammese",
    version,
    about = "Merge game and module translations into a bilingual, annotated language pack.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file to use instead of ~/.crammese/crammese.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Merge base game and module translations into the pack language file.
    Merge {
        /// Target language variant (e.g. fr_fr, es_ar).
        #[arg(short, long)]
        lang: Option<String>,

        /// Resource pack output directory.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Skip article prefixing even if a knowledge base exists.
        #[arg(long)]
        no_knowledge: bool,
    },

    /// Build the grammatical gender knowledge base for a language.
    #[command(name = "build-kb")]
    BuildKb {
        /// Target language variant (e.g. fr_fr, de_de).
        #[arg(short, long)]
        lang: Option<String>,

        /// Maximum concurrent lookups.
        #[arg(short, long)]
        concurrency: Option<u32>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "crammese=info",
        1 => "crammese=debug",
        _ => "crammese=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Merge {
            lang,
            out,
            no_knowledge,
        } => {
            let config = resolve_config(config_path.as_deref())?;
            cmd_merge(&config, lang.as_deref(), out, no_knowledge).await
        }
        Command::BuildKb { lang, concurrency } => {
            let config = resolve_config(config_path.as_deref())?;
            cmd_build_kb(&config, lang.as_deref(), concurrency).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path.as_deref()),
            ConfigAction::Show => cmd_config_show(config_path.as_deref()),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

fn target_variant(config: &AppConfig, lang: Option<&str>) -> Result<LanguageVariant> {
    let code = lang.unwrap_or(&config.defaults.language);
    Ok(LanguageVariant::parse(code)?)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_merge(
    config: &AppConfig,
    lang: Option<&str>,
    out: Option<PathBuf>,
    no_knowledge: bool,
) -> Result<()> {
    let variant = target_variant(config, lang)?;
    let reference = LanguageVariant::parse(&config.defaults.reference_language)?;
    let output_dir = out.unwrap_or_else(|| PathBuf::from(&config.defaults.output_dir));

    let layout = InstallLayout::detect(config)?;
    info!(
        game_dir = %layout.game_dir.display(),
        mods_dir = %layout.mods_dir.display(),
        "using game installation"
    );
    let provider = GameInstall::new(layout, reference, &config.defaults.game_version);

    let knowledge = if no_knowledge {
        None
    } else {
        let db = database_path(Path::new(&config.defaults.knowledge_dir), &variant);
        load_if_present(&db).await?
    };

    let merge_config = MergeConfig {
        variant: variant.clone(),
        modules: config.modules.clone(),
    };

    info!(%variant, output = %output_dir.display(), "merging translations");

    let reporter = CliProgress::new();
    let result = merge_translations(&merge_config, &provider, knowledge.as_ref(), &reporter);
    reporter.finish();
    let report = result?;

    let summary = write_language_file(&output_dir, &variant, &report.map)?;
    ensure_pack_metadata(&output_dir, &variant, &config.pack)?;

    println!();
    print_diagnostics(&report.diagnostics);
    println!();
    println!("  Language file written!");
    println!("  Language:  {variant}");
    println!("  Articles:  {}", if knowledge.is_some() { "on" } else { "off" });
    println!("  Base:      {} entries", report.base_entries);
    println!(
        "  Modules:   {}/{} loaded",
        report.loaded_modules(),
        report.diagnostics.len()
    );
    println!("  Entries:   {}", summary.entries);
    println!("  Path:      {}", summary.path.display());
    println!("  Time:      {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_build_kb(config: &AppConfig, lang: Option<&str>, concurrency: Option<u32>) -> Result<()> {
    let variant = target_variant(config, lang)?;
    let reference = LanguageVariant::parse(&config.defaults.reference_language)?;

    let mut lexicon = config.lexicon.clone();
    if let Some(n) = concurrency {
        if n == 0 {
            return Err(eyre!("--concurrency must be at least 1"));
        }
        lexicon.concurrency = n;
    }

    let build_config = BuildConfig::new(variant.clone(), config.modules.clone(), &lexicon);
    let layout = InstallLayout::detect(config)?;
    let provider = GameInstall::new(layout, reference, &config.defaults.game_version);
    let client = KaikkiClient::new(&LexiconOptions::from(&lexicon))?;

    let db = database_path(Path::new(&config.defaults.knowledge_dir), &variant);
    let store = KnowledgeStore::open(&db).await?;

    info!(%variant, concurrency = build_config.concurrency, db = %db.display(), "building knowledge base");

    let reporter = CliProgress::new();
    let result =
        build_knowledge_base(&build_config, &provider, Arc::new(client), &store, &reporter).await;
    reporter.finish();
    let report = result?;

    println!();
    println!("  Knowledge base built!");
    println!("  Language:   {variant}");
    println!("  Headwords:  {}", report.candidates);
    println!("  Resolved:   {}", report.knowledge.len());
    println!("  Skipped:    {}", report.failures.len());
    println!("  Path:       {}", db.display());
    println!("  Time:       {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };
    init_config_at(&path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_diagnostics(diagnostics: &[ModuleDiagnostic]) {
    let width = diagnostics
        .iter()
        .map(|d| d.module.len())
        .max()
        .unwrap_or(0)
        .max("MODULE".len());

    println!("  {:<width$}  STATUS", "MODULE");
    for diagnostic in diagnostics {
        println!("  {:<width$}  {}", diagnostic.module, describe_outcome(&diagnostic.outcome));
    }
}

fn describe_outcome(outcome: &ModuleOutcome) -> String {
    match outcome {
        ModuleOutcome::Loaded {
            variant,
            entries,
            fallback,
        } => {
            let via = if *fallback { " (fallback)" } else { "" };
            format!("ok, {entries} entries from {variant}{via}")
        }
        ModuleOutcome::Skipped { reason, detail } => {
            format!("skipped: {} ({detail})", reason.label())
        }
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn module_done(&self, diagnostic: &ModuleDiagnostic, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Modules [{current}/{total}] {}", diagnostic.module));
    }

    fn headword_done(&self, headword: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Looking up [{current}/{total}] {headword}"));
    }
}
