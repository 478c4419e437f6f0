//! Taxonomie hiérarchique des types d'enregistrements attendus
//!
//! Owner → Domain → RecordType. Construite une seule fois à partir d'une
//! liste plate, puis immuable. Pas de singleton : la taxonomie est passée
//! explicitement à l'analyse.

use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::CoverageError;

/// Niveau de priorité d'un type d'enregistrement
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    /// P1 : indispensable
    Critical = 1,
    /// P2 : important
    Important = 2,
    /// P3 : souhaitable
    NiceToHave = 3,
}

impl Priority {
    pub fn level(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Priority {
    type Error = CoverageError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::Critical),
            2 => Ok(Priority::Important),
            3 => Ok(Priority::NiceToHave),
            other => Err(CoverageError::InvalidPriority(other)),
        }
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> Self {
        p.level()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.level())
    }
}

/// Entrée plate servant à construire la taxonomie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub owner: String,
    pub domain: String,
    pub label: String,
    pub priority: Priority,
}

impl TaxonomyEntry {
    pub fn new(owner: &str, domain: &str, label: &str, priority: Priority) -> Self {
        Self {
            owner: owner.to_string(),
            domain: domain.to_string(),
            label: label.to_string(),
            priority,
        }
    }
}

/// Type d'enregistrement attendu (feuille de la taxonomie)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonomyLeaf {
    /// Identifiant stable dérivé de owner + domain + label
    pub id: String,
    pub owner: String,
    pub domain: String,
    pub label: String,
    pub priority: Priority,
}

/// Feuilles d'un domaine, triées par label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainGroup {
    pub domain: String,
    pub records: Vec<TaxonomyLeaf>,
}

/// Domaines d'un owner, dans l'ordre de déclaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerGroup {
    pub owner: String,
    pub groups: Vec<DomainGroup>,
}

/// Ligne de la vue aplatie : une par feuille
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonomyLeafRow {
    pub id: String,
    pub owner: String,
    pub domain: String,
    pub label: String,
    pub priority: Priority,
    /// "{owner} / {domain} / {label}"
    pub path: String,
}

/// Catalogue hiérarchique des types d'enregistrements attendus
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Taxonomy {
    pub owners: Vec<OwnerGroup>,
}

/// Owners informatifs, non alimentés par les équipes terrain
pub const DEFAULT_EXCLUDED_OWNERS: &[&str] = &["System"];

const DEFAULT_CATALOG: &[(&str, &str, &str, u8)] = &[
    ("Municipality", "Water", "As-Built", 1),
    ("Municipality", "Water", "Valve Locations", 2),
    ("Municipality", "Water", "Hydrant Locations", 3),
    ("Municipality", "Wastewater", "As-Built", 1),
    ("Municipality", "Wastewater", "Manhole Inspection", 2),
    ("Municipality", "Storm", "As-Built", 1),
    ("Municipality", "Storm", "Catch Basin Inventory", 3),
    ("Municipality", "Permits", "Excavation Permit", 1),
    ("Municipality", "Permits", "Right-of-Way Permit", 2),
    ("Municipality", "Permits", "Traffic Control Plan", 3),
    ("Utility Provider", "Gas", "As-Built", 1),
    ("Utility Provider", "Gas", "Service Records", 2),
    ("Utility Provider", "Electric", "As-Built", 1),
    ("Utility Provider", "Electric", "Pole Inventory", 3),
    ("Utility Provider", "Telecom", "As-Built", 1),
    ("Utility Provider", "Telecom", "Fiber Route Map", 2),
    ("One-Call Center", "Locates", "Locate Ticket", 1),
    ("One-Call Center", "Locates", "Markout Photos", 2),
    ("Contractor", "Survey", "Site Survey", 2),
    ("Contractor", "Survey", "Pothole Report", 1),
    ("Contractor", "Survey", "Subsurface Utility Engineering Report", 3),
    ("System", "Index", "Auto-Generated Index", 3),
];

impl Taxonomy {
    /// Construit la taxonomie depuis une liste plate
    ///
    /// Les owners exclus sont retirés avant le regroupement. Owners et
    /// domaines gardent leur ordre de première apparition; les feuilles
    /// d'un domaine sont triées par label. Une feuille en double (même
    /// owner/domain/label) garde sa première déclaration.
    pub fn from_entries<S: AsRef<str>>(
        entries: &[TaxonomyEntry],
        exclude_owners: &[S],
    ) -> Result<Self, CoverageError> {
        let excluded: HashSet<String> = exclude_owners
            .iter()
            .map(|o| o.as_ref().trim().to_lowercase())
            .collect();

        let mut owners: Vec<OwnerGroup> = Vec::new();
        let mut seen_ids: HashSet<String> = HashSet::new();

        for entry in entries {
            let owner = entry.owner.trim();
            let domain = entry.domain.trim();
            let label = entry.label.trim();

            for (field, value) in [("owner", owner), ("domain", domain), ("label", label)] {
                if value.is_empty() {
                    return Err(CoverageError::empty_entry(
                        field,
                        format!("{} / {} / {}", owner, domain, label),
                    ));
                }
            }

            if excluded.contains(&owner.to_lowercase()) {
                continue;
            }

            let id = leaf_id(owner, domain, label);
            if !seen_ids.insert(id.clone()) {
                continue;
            }

            let owner_idx = match owners.iter().position(|o| o.owner == owner) {
                Some(idx) => idx,
                None => {
                    owners.push(OwnerGroup {
                        owner: owner.to_string(),
                        groups: Vec::new(),
                    });
                    owners.len() - 1
                }
            };
            let groups = &mut owners[owner_idx].groups;

            let group_idx = match groups.iter().position(|g| g.domain == domain) {
                Some(idx) => idx,
                None => {
                    groups.push(DomainGroup {
                        domain: domain.to_string(),
                        records: Vec::new(),
                    });
                    groups.len() - 1
                }
            };

            groups[group_idx].records.push(TaxonomyLeaf {
                id,
                owner: owner.to_string(),
                domain: domain.to_string(),
                label: label.to_string(),
                priority: entry.priority,
            });
        }

        for group in owners.iter_mut().flat_map(|o| o.groups.iter_mut()) {
            group.records.sort_by(|a, b| a.label.cmp(&b.label));
        }

        Ok(Self { owners })
    }

    /// Catalogue par défaut des réseaux, owner "System" exclu
    pub fn default_catalog() -> Self {
        let entries = default_entries();
        // Le catalogue statique est valide : aucun champ vide
        Self::from_entries(&entries, DEFAULT_EXCLUDED_OWNERS).unwrap_or_default()
    }

    /// Une ligne par feuille, en profondeur : owner, puis domaine, puis label
    pub fn flatten(&self) -> Vec<TaxonomyLeafRow> {
        self.leaves()
            .map(|leaf| TaxonomyLeafRow {
                id: leaf.id.clone(),
                owner: leaf.owner.clone(),
                domain: leaf.domain.clone(),
                label: leaf.label.clone(),
                priority: leaf.priority,
                path: format!("{} / {} / {}", leaf.owner, leaf.domain, leaf.label),
            })
            .collect()
    }

    pub fn leaves(&self) -> impl Iterator<Item = &TaxonomyLeaf> {
        self.owners
            .iter()
            .flat_map(|o| o.groups.iter())
            .flat_map(|g| g.records.iter())
    }

    pub fn find(&self, id: &str) -> Option<&TaxonomyLeaf> {
        self.leaves().find(|leaf| leaf.id == id)
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().count()
    }

    pub fn is_empty(&self) -> bool {
        self.leaf_count() == 0
    }
}

/// Entrées plates du catalogue par défaut, "System" inclus
pub fn default_entries() -> Vec<TaxonomyEntry> {
    DEFAULT_CATALOG
        .iter()
        .filter_map(|&(owner, domain, label, priority)| {
            let priority = Priority::try_from(priority).ok()?;
            Some(TaxonomyEntry::new(owner, domain, label, priority))
        })
        .collect()
}

/// Slug ASCII minuscule, séparateurs réduits à un tiret
pub fn slugify(value: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    let re = NON_ALNUM.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static regex"));

    re.replace_all(&value.trim().to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

/// Identifiant stable d'une feuille
pub fn leaf_id(owner: &str, domain: &str, label: &str) -> String {
    format!("{}/{}/{}", slugify(owner), slugify(domain), slugify(label))
}
