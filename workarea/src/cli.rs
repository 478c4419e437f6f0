//! Définition et implémentation des commandes CLI
//!
//! - `analyze` : une zone, un instantané d'enregistrements
//! - `batch` : plusieurs zones sur le même lot, en parallèle
//! - `taxonomy` : affiche la taxonomie aplatie

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use coverage::analyze;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::Config;
use crate::ingest::{feature_service, load_areas, Snapshot};
use crate::report::AnalysisReport;

#[derive(Subcommand)]
pub enum Commands {
    /// Analyse record completeness inside one work area
    Analyze {
        /// Snapshot JSON: {"polygon": [...], "records": [...]}
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Additional records from a GeoJSON FeatureCollection
        #[arg(long)]
        features: Option<PathBuf>,

        /// Config preset name (utility/minimal) or path to a JSON config
        #[arg(long)]
        config: Option<String>,

        /// Write the report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Work area name shown in the report
        #[arg(long, default_value = "work-area")]
        name: String,
    },

    /// Analyse many work areas against one record pool
    Batch {
        /// JSON list of {"name": ..., "polygon": [...]}
        #[arg(short, long)]
        areas: PathBuf,

        /// Snapshot JSON providing the record pool (its polygon is ignored)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Additional records from a GeoJSON FeatureCollection
        #[arg(long)]
        features: Option<PathBuf>,

        /// Config preset name (utility/minimal) or path to a JSON config
        #[arg(long)]
        config: Option<String>,

        /// Output directory for one JSON report per area
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the flattened taxonomy
    Taxonomy {
        /// Config preset name (utility/minimal) or path to a JSON config
        #[arg(long)]
        config: Option<String>,

        /// Print a single leaf by id (e.g. municipality/water/as-built)
        #[arg(long)]
        leaf: Option<String>,
    },
}

/// Exécute la commande analyze
pub fn cmd_analyze(
    snapshot_path: &Path,
    features: Option<&Path>,
    config_spec: Option<&str>,
    output: Option<&Path>,
    name: &str,
) -> Result<()> {
    let config = Config::from_cli_or_env(config_spec)?;
    let taxonomy = config.build_taxonomy()?;
    let snapshot = load_snapshot(snapshot_path, features)?;

    info!(
        area = name,
        vertices = snapshot.polygon.len(),
        records = snapshot.records.len(),
        taxonomy_leaves = taxonomy.leaf_count(),
        "Starting analysis"
    );

    let analysis = analyze(&snapshot.polygon, &snapshot.records, &taxonomy, &config.scoring);
    let report = AnalysisReport::new(name, &snapshot.polygon, &snapshot.records, &analysis)?;

    report.display();

    if let Some(path) = output {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        info!(path = %path.display(), "Report saved");
    }

    Ok(())
}

/// Exécute la commande batch
pub fn cmd_batch(
    areas_path: &Path,
    snapshot_path: &Path,
    features: Option<&Path>,
    config_spec: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let config = Config::from_cli_or_env(config_spec)?;
    let taxonomy = config.build_taxonomy()?;
    let snapshot = load_snapshot(snapshot_path, features)?;
    let areas = load_areas(areas_path)?;

    if areas.is_empty() {
        anyhow::bail!("No work areas found in {}", areas_path.display());
    }

    if let Some(dir) = output {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let file_names = report_file_names(areas.iter().map(|area| area.name.as_str()));

    info!(
        areas = areas.len(),
        records = snapshot.records.len(),
        "Starting batch analysis"
    );

    // L'ordre des zones est conservé par collect()
    let reports: Vec<Result<AnalysisReport>> = areas
        .par_iter()
        .zip(&file_names)
        .map(|(area, file_name)| {
            let analysis = analyze(&area.polygon, &snapshot.records, &taxonomy, &config.scoring);
            let report = AnalysisReport::new(&area.name, &area.polygon, &snapshot.records, &analysis)?;
            if let Some(dir) = output {
                report.save_to_file(&dir.join(file_name))?;
            }
            Ok(report)
        })
        .collect();

    let mut inactive = 0;
    let mut failed = 0;
    for (area, result) in areas.iter().zip(&reports) {
        match result {
            Ok(report) => {
                if report.completeness_pct.is_none() {
                    inactive += 1;
                }
                println!("{}", report.summary());
            }
            Err(e) => {
                warn!("Failed to analyse {}: {}", area.name, e);
                failed += 1;
            }
        }
    }

    println!(
        "Batch complete: {} areas, {} inactive, {} failed",
        areas.len(),
        inactive,
        failed
    );

    if failed > 0 {
        warn!("{} areas failed", failed);
    }

    Ok(())
}

/// Exécute la commande taxonomy
pub fn cmd_taxonomy(config_spec: Option<&str>, leaf: Option<&str>) -> Result<()> {
    let config = Config::from_cli_or_env(config_spec)?;
    let taxonomy = config.build_taxonomy()?;

    if let Some(id) = leaf {
        let Some(leaf) = taxonomy.find(id) else {
            anyhow::bail!("Unknown taxonomy leaf: {}", id);
        };
        println!(
            "{}\t{}\t{} / {} / {}",
            leaf.priority, leaf.id, leaf.owner, leaf.domain, leaf.label
        );
        return Ok(());
    }

    for row in taxonomy.flatten() {
        println!("{}\t{}\t{}", row.priority, row.id, row.path);
    }
    info!(leaves = taxonomy.leaf_count(), "Taxonomy printed");

    Ok(())
}

/// Charge l'instantané et y ajoute les entités GeoJSON éventuelles
fn load_snapshot(path: &Path, features: Option<&Path>) -> Result<Snapshot> {
    let mut snapshot = Snapshot::load(path)?;

    if let Some(features) = features {
        let raw = feature_service::load_raw(features)?;
        let total = raw.len();
        let added = snapshot.extend_raw(raw);
        info!(path = %features.display(), total, added, "Loaded GeoJSON records");
    }

    Ok(snapshot)
}

/// Noms de fichiers de rapport, uniques même si deux zones se nettoient
/// vers le même nom
fn report_file_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    names
        .into_iter()
        .map(|name| {
            let base = sanitize_file_name(name);
            let mut candidate = base.clone();
            let mut n = 2;
            while !taken.insert(candidate.clone()) {
                candidate = format!("{}-{}", base, n);
                n += 1;
            }
            if candidate != base {
                warn!(area = name, file = %candidate, "Report file name already used, renamed");
            }
            format!("{}.json", candidate)
        })
        .collect()
}

/// Nom de fichier sûr pour un nom de zone
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();

    if cleaned.is_empty() {
        "area".to_string()
    } else {
        cleaned
    }
}
