//! Label-set validation against the taxonomy cardinality rules.
//!
//! Recommended shape for an issue: exactly one Type label, zero to two Domain
//! labels and zero to two Scope labels, with no labels outside the taxonomy.
//! Only the Type count and unknown labels are errors; everything else warns.

use serde::Serialize;

use crate::label::{normalize, Category};
use crate::registry::TAXONOMY;

/// Domain labels above this count produce a scope-creep warning.
pub const MAX_DOMAIN_LABELS: usize = 2;
/// Scope labels above this count produce a warning.
pub const MAX_SCOPE_LABELS: usize = 2;

/// Labels bucketed by category. Names are normalized (trimmed, lowercase).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedLabels {
    pub domain: Vec<String>,
    #[serde(rename = "type")]
    pub kind: Vec<String>,
    pub scope: Vec<String>,
    pub unknown: Vec<String>,
}

impl ParsedLabels {
    fn bucket(&mut self, category: Option<Category>) -> &mut Vec<String> {
        match category {
            Some(Category::Domain) => &mut self.domain,
            Some(Category::Type) => &mut self.kind,
            Some(Category::Scope) => &mut self.scope,
            None => &mut self.unknown,
        }
    }

    fn contains(&self, name: &str) -> bool {
        [&self.domain, &self.kind, &self.scope, &self.unknown]
            .iter()
            .any(|bucket| bucket.iter().any(|n| n == name))
    }
}

/// Outcome of validating one label set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub parsed: ParsedLabels,
}

/// Validate a label set.
///
/// Blank entries are ignored and repeated names (after normalization) count
/// once. Pure function of its input and the static taxonomy.
#[must_use]
pub fn validate<S: AsRef<str>>(labels: &[S]) -> ValidationResult {
    let mut parsed = ParsedLabels::default();

    for raw in labels {
        let name = normalize(raw.as_ref());
        if name.is_empty() || parsed.contains(&name) {
            continue;
        }
        let category = TAXONOMY.category_of(&name);
        parsed.bucket(category).push(name);
    }

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    match parsed.kind.len() {
        0 => errors.push(format!(
            "Missing required Type label (one of: {})",
            TAXONOMY.names(Category::Type)
        )),
        1 => {}
        _ => errors.push(format!(
            "Multiple Type labels found: {} (exactly one required)",
            parsed.kind.join(", ")
        )),
    }

    if parsed.domain.is_empty() {
        warnings.push(
            "No Domain label; routing will fall back to the general agent pool".to_string(),
        );
    } else if parsed.domain.len() > MAX_DOMAIN_LABELS {
        warnings.push(format!(
            "{} Domain labels ({}); more than {MAX_DOMAIN_LABELS} suggests scope creep, consider splitting the issue",
            parsed.domain.len(),
            parsed.domain.join(", ")
        ));
    }

    if parsed.scope.len() > MAX_SCOPE_LABELS {
        warnings.push(format!(
            "{} Scope labels ({}); at most {MAX_SCOPE_LABELS} recommended",
            parsed.scope.len(),
            parsed.scope.join(", ")
        ));
    }

    if !parsed.unknown.is_empty() {
        errors.push(format!(
            "Unknown labels not in taxonomy: {}",
            parsed.unknown.join(", ")
        ));
    }

    ValidationResult {
        valid: errors.is_empty(),
        errors,
        warnings,
        parsed,
    }
}
