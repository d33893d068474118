use super::taxonomy::{Category, DocumentType, Hazard, Role, Taxonomy, DOCUMENT_TYPES, HAZARDS, ROLES};

/// Keyword-driven classifier over the static taxonomies.
pub struct Categorizer {
    document_types: &'static Taxonomy<DocumentType>,
    roles: &'static Taxonomy<Role>,
    hazards: &'static Taxonomy<Hazard>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorizationResult {
    pub document_type: DocumentType,
    pub roles: Vec<Role>,
    pub hazards: Vec<Hazard>,
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::standard()
    }
}

impl Categorizer {
    pub fn standard() -> Self {
        Self {
            document_types: &DOCUMENT_TYPES,
            roles: &ROLES,
            hazards: &HAZARDS,
        }
    }

    /// Classifies raw document text. Matching is case-insensitive.
    pub fn categorize(&self, text: &str) -> CategorizationResult {
        let lowered = text.to_lowercase();

        CategorizationResult {
            document_type: classify(self.document_types, &lowered).unwrap_or(DocumentType::Unknown),
            roles: detect(self.roles, &lowered),
            hazards: detect(self.hazards, &lowered),
        }
    }

    pub fn document_type(&self, text: &str) -> DocumentType {
        classify(self.document_types, &text.to_lowercase()).unwrap_or(DocumentType::Unknown)
    }
}

/// Number of distinct trigger phrases of a category present in `lowered`.
pub fn score(phrases: &[&str], lowered: &str) -> usize {
    phrases.iter().filter(|phrase| lowered.contains(**phrase)).count()
}

/// Returns the highest-scoring category, or `None` when nothing matches.
///
/// A later category only replaces the current leader with a strictly higher
/// score, so ties go to the category defined first.
pub fn classify<C: Category>(taxonomy: &Taxonomy<C>, lowered: &str) -> Option<C> {
    let mut best: Option<(C, usize)> = None;

    for (category, phrases) in taxonomy.entries() {
        let points = score(phrases, lowered);
        match best {
            Some((_, top)) if points <= top => {}
            _ if points == 0 => {}
            _ => best = Some((*category, points)),
        }
    }

    best.map(|(category, _)| category)
}

/// Every category with at least one trigger phrase present, in table order.
pub fn detect<C: Category>(taxonomy: &Taxonomy<C>, lowered: &str) -> Vec<C> {
    taxonomy
        .entries()
        .iter()
        .filter(|(_, phrases)| phrases.iter().any(|phrase| lowered.contains(*phrase)))
        .map(|(category, _)| *category)
        .collect()
}
