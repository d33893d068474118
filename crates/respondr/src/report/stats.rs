//! Aggregate figures over a set of document records.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::categorizer::Category;
use crate::metadata::DocumentRecord;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub total_docs: usize,
    pub total_orgs: usize,
    /// Mean page count, rounded to one decimal; 0 for an empty set.
    pub avg_pages: f64,
    pub total_pages: u64,
    pub total_size: u64,
    pub document_types: BTreeMap<String, usize>,
    pub roles: BTreeMap<String, usize>,
    pub hazards: BTreeMap<String, usize>,
    pub organizations: BTreeMap<String, usize>,
}

impl Statistics {
    pub fn from_records(records: &[DocumentRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let mut stats = Self {
            total_docs: records.len(),
            ..Self::default()
        };
        let mut orgs = BTreeSet::new();

        for record in records {
            stats.total_pages += u64::from(record.page_count);
            stats.total_size += record.file_size_bytes;
            orgs.insert(record.organization_id.as_str());

            bump(&mut stats.document_types, record.document_type.as_str());
            for role in &record.roles_involved {
                bump(&mut stats.roles, role.as_str());
            }
            for hazard in &record.hazard_types {
                bump(&mut stats.hazards, hazard.as_str());
            }
            bump(&mut stats.organizations, &record.organization_id);
        }

        stats.total_orgs = orgs.len();
        let avg = stats.total_pages as f64 / records.len() as f64;
        stats.avg_pages = (avg * 10.0).round() / 10.0;
        stats
    }
}

fn bump(counts: &mut BTreeMap<String, usize>, name: &str) {
    *counts.entry(name.to_string()).or_insert(0) += 1;
}

/// Entries ordered by count, highest first; ties by name.
pub fn ranked(counts: &BTreeMap<String, usize>) -> Vec<(&str, usize)> {
    let mut entries: Vec<(&str, usize)> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries
}

/// Human-readable size: one decimal in B, KB, MB or GB, TB beyond.
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if value < 1024.0 {
            return format!("{:.1} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.1} TB", value)
}
