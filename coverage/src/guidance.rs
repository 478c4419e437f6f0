//! Rapport de guidage : types d'enregistrements manquants par groupe
//!
//! Croise la taxonomie aplatie avec les chemins des enregistrements
//! présents dans la zone. Les groupes ayant un manque P1 remontent en tête.

use std::collections::HashSet;
use std::fmt::Write;

use serde::Serialize;

use crate::classify::normalize_path;
use crate::taxonomy::{Priority, Taxonomy, TaxonomyLeafRow};
use crate::types::Record;

/// Statut d'un groupe owner/domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GroupStatus {
    Complete,
    Incomplete,
}

/// Feuilles présentes et manquantes d'un groupe owner/domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuidanceGroup {
    pub owner: String,
    pub domain: String,
    pub status: GroupStatus,
    /// Triées par priorité puis label
    pub present: Vec<TaxonomyLeafRow>,
    /// Triées par priorité puis label
    pub missing: Vec<TaxonomyLeafRow>,
}

impl GuidanceGroup {
    /// Priorité la plus haute (plus petit niveau) parmi les manques
    pub fn top_missing_priority(&self) -> Option<Priority> {
        self.missing.iter().map(|row| row.priority).min()
    }

    pub fn header(&self) -> String {
        format!("{} / {}", self.owner, self.domain)
    }
}

/// Vue par groupe, groupes complets inclus
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GuidanceReport {
    pub groups: Vec<GuidanceGroup>,
}

impl GuidanceReport {
    pub fn missing_count(&self) -> usize {
        self.groups.iter().map(|g| g.missing.len()).sum()
    }

    pub fn complete_groups(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| g.status == GroupStatus::Complete)
            .count()
    }

    /// Checklist copiable; les groupes complets sont omis
    pub fn checklist(&self) -> String {
        let mut out = String::new();
        for group in self.groups.iter().filter(|g| !g.missing.is_empty()) {
            let _ = writeln!(out, "{}", group.header());
            for row in &group.missing {
                let _ = writeln!(out, "  - [ ] {} ({})", row.label, row.priority);
            }
        }
        out
    }
}

/// Construit le rapport de guidage pour les enregistrements présents
pub fn guidance(taxonomy: &Taxonomy, present: &[&Record]) -> GuidanceReport {
    let present_paths: HashSet<String> = present
        .iter()
        .map(|r| normalize_path(&r.record_type_path))
        .filter(|p| !p.is_empty())
        .collect();

    let mut groups: Vec<GuidanceGroup> = Vec::new();
    for row in taxonomy.flatten() {
        let idx = match groups
            .iter()
            .position(|g| g.owner == row.owner && g.domain == row.domain)
        {
            Some(idx) => idx,
            None => {
                groups.push(GuidanceGroup {
                    owner: row.owner.clone(),
                    domain: row.domain.clone(),
                    status: GroupStatus::Complete,
                    present: Vec::new(),
                    missing: Vec::new(),
                });
                groups.len() - 1
            }
        };

        if present_paths.contains(&normalize_path(&row.path)) {
            groups[idx].present.push(row);
        } else {
            groups[idx].missing.push(row);
        }
    }

    for group in &mut groups {
        group.present.sort_by(leaf_order);
        group.missing.sort_by(leaf_order);
        if !group.missing.is_empty() {
            group.status = GroupStatus::Incomplete;
        }
    }

    // Sans manque : après tous les groupes incomplets
    groups.sort_by(|a, b| {
        let pa = a.top_missing_priority().map_or(u8::MAX, Priority::level);
        let pb = b.top_missing_priority().map_or(u8::MAX, Priority::level);
        pa.cmp(&pb)
            .then_with(|| a.domain.cmp(&b.domain))
            .then_with(|| a.owner.cmp(&b.owner))
    });

    GuidanceReport { groups }
}

fn leaf_order(a: &TaxonomyLeafRow, b: &TaxonomyLeafRow) -> std::cmp::Ordering {
    a.priority
        .cmp(&b.priority)
        .then_with(|| a.label.cmp(&b.label))
}
