//! Score de complétude d'une zone de travail
//!
//! Deux sous-scores mélangés : couverture des catégories canoniques et
//! densité brute d'enregistrements (fonction saturante). Les lacunes sont
//! calculées indépendamment du score.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::classify::{bucket_by_category, is_as_built, record_type_token, UtilityCategory};
use crate::containment::WorkArea;
use crate::types::{Point, Record};
use crate::CoverageError;

/// Clé de `records_by_type` pour un enregistrement sans type lisible
pub const UNKNOWN_RECORD_TYPE: &str = "unknown";

/// Paramètres du score
///
/// Les pondérations et le seuil "peu d'enregistrements" sont des choix
/// heuristiques, réglables ici plutôt que figés dans le code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Poids du score de couverture des catégories
    pub coverage_weight: f64,

    /// Poids du score de densité
    pub density_weight: f64,

    /// Multiplicateur de ln(n + 1) pour la densité
    pub density_factor: f64,

    /// En dessous de ce nombre (exclu), lacune "très peu d'enregistrements"
    pub few_records_threshold: usize,

    /// Types d'enregistrement reconnus comme plans de récolement
    pub as_built_synonyms: Vec<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            coverage_weight: 0.5,
            density_weight: 0.5,
            density_factor: 35.0,
            few_records_threshold: 3,
            as_built_synonyms: [
                "as-built",
                "asbuilt",
                "as built",
                "as-builts",
                "record drawing",
                "record drawings",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl ScoringConfig {
    /// Vérifie les pondérations et le facteur de densité
    pub fn validate(&self) -> Result<(), CoverageError> {
        let (c, d) = (self.coverage_weight, self.density_weight);
        let weights_ok = c.is_finite() && d.is_finite() && c >= 0.0 && d >= 0.0 && c + d > 0.0;
        let factor_ok = self.density_factor.is_finite() && self.density_factor >= 0.0;

        if weights_ok && factor_ok {
            Ok(())
        } else {
            Err(CoverageError::InvalidWeights {
                coverage: c,
                density: d,
            })
        }
    }

    /// Pondérations normalisées (somme = 1); 50/50 si la configuration est invalide
    fn normalized_weights(&self) -> (f64, f64) {
        if self.validate().is_err() {
            return (0.5, 0.5);
        }
        let total = self.coverage_weight + self.density_weight;
        (self.coverage_weight / total, self.density_weight / total)
    }

    fn effective_density_factor(&self) -> f64 {
        if self.density_factor.is_finite() && self.density_factor >= 0.0 {
            self.density_factor
        } else {
            Self::default().density_factor
        }
    }
}

/// Lacune constatée dans la zone de travail
///
/// Texte indicatif; la liste n'est ni ordonnée ni exhaustive. Sérialisée
/// sous sa forme texte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gap {
    MissingCategories { categories: Vec<UtilityCategory> },
    NoRecords,
    FewRecords { count: usize },
    NoAsBuilts,
}

impl fmt::Display for Gap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gap::MissingCategories { categories } => {
                let labels: Vec<&str> = categories.iter().map(|c| c.label()).collect();
                write!(f, "Missing utility categories: {}", labels.join(", "))
            }
            Gap::NoRecords => f.write_str("No records found in the work area"),
            Gap::FewRecords { count } => {
                write!(f, "Very few records in the work area ({})", count)
            }
            Gap::NoAsBuilts => f.write_str("No As-Built drawings found"),
        }
    }
}

impl Serialize for Gap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Résultat de complétude, recalculé à chaque appel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletenessResult {
    /// 0..=100
    pub completeness_pct: u8,
    pub coverage_score: f64,
    pub density_score: f64,
    pub record_count: usize,
    pub categories_present: BTreeSet<UtilityCategory>,
    pub categories_missing: BTreeSet<UtilityCategory>,
    pub records_by_type: BTreeMap<String, usize>,
    pub gaps: Vec<Gap>,
}

impl CompletenessResult {
    pub fn gap_lines(&self) -> Vec<String> {
        self.gaps.iter().map(|g| g.to_string()).collect()
    }
}

/// Complétude d'une zone : inactive si le polygone est sous-spécifié
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Completeness {
    Inactive,
    Active(CompletenessResult),
}

impl Completeness {
    pub fn is_active(&self) -> bool {
        matches!(self, Completeness::Active(_))
    }

    pub fn result(&self) -> Option<&CompletenessResult> {
        match self {
            Completeness::Active(result) => Some(result),
            Completeness::Inactive => None,
        }
    }
}

/// (catégories présentes / 6) × 100
pub fn coverage_score(present: usize) -> f64 {
    let target = UtilityCategory::ALL.len() as f64;
    (present.min(UtilityCategory::ALL.len()) as f64 / target) * 100.0
}

/// min(100, ln(n + 1) × facteur) : 0 pour un ensemble vide
pub fn density_score(record_count: usize, factor: f64) -> f64 {
    ((record_count as f64 + 1.0).ln() * factor).min(100.0)
}

/// Mélange pondéré arrondi, borné à [0, 100]
pub fn blend(coverage: f64, density: f64, config: &ScoringConfig) -> u8 {
    let (wc, wd) = config.normalized_weights();
    let pct = (wc * coverage + wd * density).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Score d'un ensemble d'enregistrements déjà filtré par la zone
pub fn score_records(records: &[&Record], config: &ScoringConfig) -> CompletenessResult {
    let record_count = records.len();

    let categories_present: BTreeSet<UtilityCategory> =
        bucket_by_category(records.iter().copied()).into_keys().collect();
    let categories_missing: BTreeSet<UtilityCategory> = UtilityCategory::ALL
        .iter()
        .copied()
        .filter(|c| !categories_present.contains(c))
        .collect();

    let mut records_by_type: BTreeMap<String, usize> = BTreeMap::new();
    let mut has_as_built = false;
    for record in records {
        let token = record_type_token(record);
        if let Some(ref t) = token {
            has_as_built |= is_as_built(t, &config.as_built_synonyms);
        }
        *records_by_type
            .entry(token.unwrap_or_else(|| UNKNOWN_RECORD_TYPE.to_string()))
            .or_insert(0) += 1;
    }

    let coverage = coverage_score(categories_present.len());
    let density = density_score(record_count, config.effective_density_factor());
    let completeness_pct = blend(coverage, density, config);

    let mut gaps = Vec::new();
    if !categories_missing.is_empty() {
        gaps.push(Gap::MissingCategories {
            categories: categories_missing.iter().copied().collect(),
        });
    }
    if record_count == 0 {
        gaps.push(Gap::NoRecords);
    } else if record_count < config.few_records_threshold {
        gaps.push(Gap::FewRecords {
            count: record_count,
        });
    }
    if record_count > 0 && !has_as_built {
        gaps.push(Gap::NoAsBuilts);
    }

    debug!(
        records = record_count,
        categories = categories_present.len(),
        completeness = completeness_pct,
        "Scored work area"
    );

    CompletenessResult {
        completeness_pct,
        coverage_score: coverage,
        density_score: density,
        record_count,
        categories_present,
        categories_missing,
        records_by_type,
        gaps,
    }
}

/// Complétude d'une zone de travail sur un lot d'enregistrements
pub fn completeness(polygon: &[Point], records: &[Record], config: &ScoringConfig) -> Completeness {
    match WorkArea::new(polygon) {
        Some(area) => Completeness::Active(score_records(&area.filter(records), config)),
        None => Completeness::Inactive,
    }
}
