//! Configuration de l'analyse : taxonomie et paramètres du score

use serde::{Deserialize, Serialize};
use std::path::Path;

use anyhow::{Context, Result};
use coverage::taxonomy::{default_entries, DEFAULT_EXCLUDED_OWNERS};
use coverage::{ScoringConfig, Taxonomy, TaxonomyEntry};

/// Presets embarqués
pub const PRESETS: &[&str] = &["utility", "minimal"];

/// Variable d'environnement donnant la configuration par défaut
pub const CONFIG_ENV: &str = "WORKAREA_CONFIG";

/// Configuration principale
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Entrées plates de la taxonomie (vide : catalogue intégré)
    #[serde(default)]
    pub taxonomy: Vec<TaxonomyEntry>,

    /// Owners retirés avant regroupement
    #[serde(default = "default_excluded_owners")]
    pub exclude_owners: Vec<String>,

    /// Paramètres du score, complétés champ par champ
    #[serde(default)]
    pub scoring: ScoringConfig,
}

fn default_excluded_owners() -> Vec<String> {
    DEFAULT_EXCLUDED_OWNERS.iter().map(|s| s.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            taxonomy: Vec::new(),
            exclude_owners: default_excluded_owners(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "utility" => Self::load_embedded(include_str!("presets/utility.json")),
            "minimal" => Self::load_embedded(include_str!("presets/minimal.json")),
            _ => anyhow::bail!("Unknown preset: {}. Use: utility, minimal", preset),
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse embedded config")
    }

    /// Preset si le nom est connu, sinon chemin de fichier
    pub fn resolve(spec: &str) -> Result<Self> {
        if PRESETS.contains(&spec) {
            Self::from_preset(spec)
        } else {
            Self::load(Path::new(spec))
        }
    }

    /// `--config`, sinon `WORKAREA_CONFIG`, sinon configuration par défaut
    pub fn from_cli_or_env(spec: Option<&str>) -> Result<Self> {
        match spec {
            Some(spec) => Self::resolve(spec),
            None => match std::env::var(CONFIG_ENV) {
                Ok(spec) if !spec.trim().is_empty() => Self::resolve(spec.trim()),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Construit la taxonomie et vérifie les paramètres du score
    pub fn build_taxonomy(&self) -> Result<Taxonomy> {
        self.scoring
            .validate()
            .context("Invalid scoring configuration")?;

        let entries = if self.taxonomy.is_empty() {
            default_entries()
        } else {
            self.taxonomy.clone()
        };

        Taxonomy::from_entries(&entries, &self.exclude_owners).context("Invalid taxonomy")
    }
}
