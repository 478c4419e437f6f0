//! # coverage
//!
//! Moteur de complétude et de couverture des enregistrements de réseaux
//! (as-builts, locates, permis...) dans une zone de travail dessinée.
//!
//! ## Étapes
//!
//! 1. Filtrage des enregistrements dont un fichier géoréférencé tombe dans
//!    le polygone (`containment`)
//! 2. Classification en catégories de réseau canoniques (`classify`)
//! 3. Score de complétude et lacunes (`scoring`)
//! 4. Types d'enregistrements manquants par groupe de la taxonomie (`guidance`)
//!
//! Toutes les étapes sont des fonctions pures sur des entrées immuables :
//! aucune I/O, aucun état partagé. Appelables depuis plusieurs threads.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use coverage::{analyze, Point, ScoringConfig, Taxonomy};
//!
//! let taxonomy = Taxonomy::default_catalog();
//! let analysis = analyze(&polygon, &records, &taxonomy, &ScoringConfig::default());
//!
//! if let coverage::Analysis::Active(active) = analysis {
//!     println!("{}%", active.completeness.completeness_pct);
//!     print!("{}", active.guidance.checklist());
//! }
//! ```

pub mod classify;
pub mod containment;
pub mod error;
pub mod geometry;
pub mod guidance;
pub mod scoring;
pub mod taxonomy;
pub mod types;

pub use classify::UtilityCategory;
pub use containment::{records_inside, WorkArea};
pub use error::CoverageError;
pub use guidance::{GroupStatus, GuidanceGroup, GuidanceReport};
pub use scoring::{Completeness, CompletenessResult, Gap, ScoringConfig};
pub use taxonomy::{Priority, Taxonomy, TaxonomyEntry, TaxonomyLeaf, TaxonomyLeafRow};
pub use types::{File, FileStatus, GeoFeature, GeomType, Point, Record};

use serde::Serialize;
use tracing::debug;

/// Résultat complet d'une analyse de zone
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Analysis {
    /// Polygone de moins de 3 sommets : analyse non applicable
    Inactive,
    Active(ActiveAnalysis),
}

/// Analyse d'une zone active
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveAnalysis {
    /// Aire planaire approchée de la zone
    pub area_sq_meters: f64,

    /// Identifiants des enregistrements présents, dans l'ordre d'entrée
    pub inside_record_ids: Vec<String>,

    pub completeness: CompletenessResult,

    pub guidance: GuidanceReport,
}

impl Analysis {
    pub fn is_active(&self) -> bool {
        matches!(self, Analysis::Active(_))
    }

    pub fn active(&self) -> Option<&ActiveAnalysis> {
        match self {
            Analysis::Active(active) => Some(active),
            Analysis::Inactive => None,
        }
    }
}

/// Analyse une zone de travail : filtrage, score et guidage
///
/// # Arguments
///
/// * `polygon` - Sommets de la zone, fermeture implicite
/// * `records` - Instantané des enregistrements candidats
/// * `taxonomy` - Types d'enregistrements attendus
/// * `config` - Paramètres du score
///
/// # Returns
///
/// `Analysis::Inactive` si le polygone a moins de 3 sommets, sinon le
/// résultat complet. Ne retourne jamais d'erreur.
pub fn analyze(
    polygon: &[Point],
    records: &[Record],
    taxonomy: &Taxonomy,
    config: &ScoringConfig,
) -> Analysis {
    let Some(area) = WorkArea::new(polygon) else {
        debug!(vertices = polygon.len(), "Work area inactive");
        return Analysis::Inactive;
    };

    let inside = area.filter(records);
    let completeness = scoring::score_records(&inside, config);
    let guidance = guidance::guidance(taxonomy, &inside);

    Analysis::Active(ActiveAnalysis {
        area_sq_meters: area.area_sq_meters(),
        inside_record_ids: inside.iter().map(|r| r.id.clone()).collect(),
        completeness,
        guidance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_inactive() {
        let taxonomy = Taxonomy::default_catalog();
        let analysis = analyze(&[], &[], &taxonomy, &ScoringConfig::default());
        assert_eq!(analysis, Analysis::Inactive);
        assert!(analysis.active().is_none());
    }

    #[test]
    fn test_analyze_empty_area() {
        let polygon = [
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
        ];
        let taxonomy = Taxonomy::default_catalog();
        let analysis = analyze(&polygon, &[], &taxonomy, &ScoringConfig::default());

        let active = analysis.active().unwrap();
        assert!(active.inside_record_ids.is_empty());
        assert_eq!(active.completeness.completeness_pct, 0);
        assert_eq!(active.guidance.missing_count(), taxonomy.leaf_count());
    }
}
