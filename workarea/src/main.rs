//! Point d'entrée CLI pour workarea

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use workarea::cli::{self, Commands};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

/// Analyser la complétude des enregistrements de réseaux dans une zone de travail
#[derive(Parser)]
#[command(name = "workarea")]
#[command(author, version)]
#[command(about = "Analyse record completeness and coverage inside a drawn work area")]
#[command(long_about = "Filters geo-tagged utility records to a work-area polygon, scores category coverage and record density, and lists the expected record types that are still missing.\n\nThe default config can be set with WORKAREA_CONFIG (preset name or JSON path).")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Analyze {
            snapshot,
            features,
            config,
            output,
            name,
        } => cli::cmd_analyze(
            &snapshot,
            features.as_deref(),
            config.as_deref(),
            output.as_deref(),
            &name,
        )?,
        Commands::Batch {
            areas,
            snapshot,
            features,
            config,
            output,
        } => cli::cmd_batch(
            &areas,
            &snapshot,
            features.as_deref(),
            config.as_deref(),
            output.as_deref(),
        )?,
        Commands::Taxonomy { config, leaf } => {
            cli::cmd_taxonomy(config.as_deref(), leaf.as_deref())?
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
