//! Classification des enregistrements en catégories de réseau canoniques
//!
//! Toute la normalisation des champs d'un enregistrement passe par ce
//! module : les étapes suivantes ne lisent que des clés canoniques. Un
//! chemin non reconnu n'est pas une erreur, l'enregistrement est
//! simplement exclu du score par catégorie.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::types::Record;

/// Les six domaines de réseau utilisés pour le score de couverture
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum UtilityCategory {
    Water,
    Gas,
    Electric,
    Telecom,
    Storm,
    Wastewater,
}

impl UtilityCategory {
    /// Ensemble cible, dans l'ordre d'affichage
    pub const ALL: [UtilityCategory; 6] = [
        UtilityCategory::Water,
        UtilityCategory::Gas,
        UtilityCategory::Electric,
        UtilityCategory::Telecom,
        UtilityCategory::Storm,
        UtilityCategory::Wastewater,
    ];

    /// Clé stable en minuscules
    pub fn key(self) -> &'static str {
        match self {
            UtilityCategory::Water => "water",
            UtilityCategory::Gas => "gas",
            UtilityCategory::Electric => "electric",
            UtilityCategory::Telecom => "telecom",
            UtilityCategory::Storm => "storm",
            UtilityCategory::Wastewater => "wastewater",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UtilityCategory::Water => "Water",
            UtilityCategory::Gas => "Gas",
            UtilityCategory::Electric => "Electric",
            UtilityCategory::Telecom => "Telecom",
            UtilityCategory::Storm => "Storm",
            UtilityCategory::Wastewater => "Wastewater",
        }
    }
}

impl fmt::Display for UtilityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct Rule {
    category: UtilityCategory,
    keywords: &'static [&'static str],
    excludes: &'static [&'static str],
}

impl Rule {
    fn matches(&self, segment: &str) -> bool {
        self.keywords.iter().any(|k| segment.contains(k))
            && !self.excludes.iter().any(|x| segment.contains(x))
    }
}

// Ordre de précédence : la première règle qui correspond l'emporte
const RULES: &[Rule] = &[
    Rule {
        category: UtilityCategory::Wastewater,
        keywords: &["wastewater", "sanitary"],
        excludes: &[],
    },
    Rule {
        category: UtilityCategory::Storm,
        keywords: &["storm"],
        excludes: &[],
    },
    Rule {
        category: UtilityCategory::Gas,
        keywords: &["gas"],
        excludes: &[],
    },
    Rule {
        category: UtilityCategory::Electric,
        keywords: &["electric", "power", "hydro"],
        excludes: &[],
    },
    Rule {
        category: UtilityCategory::Telecom,
        keywords: &["telecom", "telco"],
        excludes: &[],
    },
    Rule {
        category: UtilityCategory::Water,
        keywords: &["water"],
        excludes: &["waste", "storm"],
    },
];

/// Segments du chemin : découpés sur `/`, trimés, en minuscules, non vides
pub fn segments(path: &str) -> Vec<String> {
    path.split('/')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Forme canonique d'un chemin, pour comparer des chemins saisis librement
pub fn normalize_path(path: &str) -> String {
    segments(path).join(" / ")
}

/// Catégorie canonique d'un chemin libre
pub fn classify_utility(path: &str) -> Option<UtilityCategory> {
    let segments = segments(path);
    RULES
        .iter()
        .find(|rule| segments.iter().any(|s| rule.matches(s)))
        .map(|rule| rule.category)
}

/// Catégorie canonique d'un enregistrement
///
/// Le champ `utility_type` normalisé prime; à défaut, le chemin libre.
pub fn classify_record(record: &Record) -> Option<UtilityCategory> {
    let category = record
        .utility_type
        .as_deref()
        .and_then(classify_utility)
        .or_else(|| classify_utility(&record.record_type_path));

    trace!(record_id = %record.id, category = ?category, "Classified record");
    category
}

/// Type d'enregistrement normalisé : champ explicite, sinon dernier segment
pub fn record_type_token(record: &Record) -> Option<String> {
    record
        .record_type
        .as_deref()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .or_else(|| segments(&record.record_type_path).pop())
}

/// Le type correspond-il à un synonyme de "as-built"
pub fn is_as_built(token: &str, synonyms: &[String]) -> bool {
    let token = token.trim().to_lowercase();
    synonyms
        .iter()
        .map(|s| s.trim().to_lowercase())
        .any(|s| !s.is_empty() && token.contains(&s))
}

/// Regroupe les enregistrements par catégorie; les non classés sont ignorés
pub fn bucket_by_category<'a, I>(records: I) -> BTreeMap<UtilityCategory, Vec<&'a Record>>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut buckets: BTreeMap<UtilityCategory, Vec<&'a Record>> = BTreeMap::new();
    for record in records {
        if let Some(category) = classify_record(record) {
            buckets.entry(category).or_default().push(record);
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_basic_paths() {
        assert_eq!(classify_utility("City / Water / As-Built"), Some(UtilityCategory::Water));
        assert_eq!(classify_utility("Gas Co / Gas / Service"), Some(UtilityCategory::Gas));
        assert_eq!(classify_utility("Hydro One / Lines"), Some(UtilityCategory::Electric));
        assert_eq!(classify_utility("Telco / Fiber"), Some(UtilityCategory::Telecom));
        assert_eq!(classify_utility("City/Storm/Catch Basins"), Some(UtilityCategory::Storm));
    }

    #[test]
    fn test_classify_wastewater_variants() {
        assert_eq!(
            classify_utility("wastewater/sanitary"),
            Some(UtilityCategory::Wastewater)
        );
        assert_eq!(
            classify_utility("City / Sanitary Sewer / Laterals"),
            Some(UtilityCategory::Wastewater)
        );
    }

    #[test]
    fn test_water_excludes_waste_and_storm() {
        assert_eq!(classify_utility("Stormwater / Ponds"), Some(UtilityCategory::Storm));
        assert_eq!(classify_utility("Waste Water"), None);
        assert_eq!(classify_utility("Drinking Water"), Some(UtilityCategory::Water));
    }

    #[test]
    fn test_classify_unknown_is_none() {
        assert_eq!(classify_utility("Municipality / Permits / Excavation Permit"), None);
        assert_eq!(classify_utility(""), None);
        assert_eq!(classify_utility(" / / "), None);
    }

    #[test]
    fn test_classify_record_prefers_utility_type() {
        let mut record = Record::new("r1", "Contractor / Survey / Pothole Report");
        assert_eq!(classify_record(&record), None);

        record.utility_type = Some("Natural Gas".to_string());
        assert_eq!(classify_record(&record), Some(UtilityCategory::Gas));

        record.utility_type = Some("misc".to_string());
        record.record_type_path = "City / Water / As-Built".to_string();
        assert_eq!(classify_record(&record), Some(UtilityCategory::Water));
    }

    #[test]
    fn test_record_type_token() {
        let mut record = Record::new("r1", "City / Water / As-Built ");
        assert_eq!(record_type_token(&record).as_deref(), Some("as-built"));

        record.record_type = Some("Locate Ticket".to_string());
        assert_eq!(record_type_token(&record).as_deref(), Some("locate ticket"));

        let empty = Record::new("r2", "");
        assert_eq!(record_type_token(&empty), None);
    }

    #[test]
    fn test_is_as_built() {
        let synonyms = vec!["as-built".to_string(), "record drawing".to_string()];
        assert!(is_as_built("As-Built", &synonyms));
        assert!(is_as_built("as-built drawings", &synonyms));
        assert!(is_as_built("Record Drawing", &synonyms));
        assert!(!is_as_built("locate ticket", &synonyms));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("City/Water/As-Built"), "city / water / as-built");
        assert_eq!(normalize_path("  City /  Water / As-Built "), "city / water / as-built");
    }

    #[test]
    fn test_bucket_by_category() {
        let records = vec![
            Record::new("a", "City / Water / As-Built"),
            Record::new("b", "City / Water / Valves"),
            Record::new("c", "Gas Co / Gas / As-Built"),
            Record::new("d", "Misc / Notes"),
        ];
        let buckets = bucket_by_category(&records);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[&UtilityCategory::Water].len(), 2);
        assert_eq!(buckets[&UtilityCategory::Gas].len(), 1);
    }
}
