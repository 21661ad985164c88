//! Static label taxonomy.
//!
//! The table below is the schema other tooling reproduces: name, category,
//! description, color and agent affinities. Name lookups are case-insensitive.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::label::AgentId::{
    ApiDesigner, BackendArchitect, CodeReviewer, DatabaseArchitect, DevopsEngineer, DocsWriter,
    FrontendDeveloper, MlEngineer, MobileDeveloper, PerformanceEngineer, SecurityManager,
    TestAutomator,
};
use crate::label::{normalize, AgentId, Category, LabelDefinition};

/// Bumped whenever a label is added, removed or re-routed.
pub const TAXONOMY_VERSION: &str = "1.2.0";

/// Color used for labels the taxonomy does not know.
pub const DEFAULT_LABEL_COLOR: &str = "#9CA3AF";

const fn domain(
    name: &'static str,
    description: &'static str,
    color: &'static str,
    primary_agents: &'static [AgentId],
    secondary_agents: &'static [AgentId],
) -> LabelDefinition {
    LabelDefinition {
        name,
        category: Category::Domain,
        description,
        color,
        primary_agents,
        secondary_agents,
    }
}

const fn plain(
    category: Category,
    name: &'static str,
    description: &'static str,
    color: &'static str,
) -> LabelDefinition {
    LabelDefinition {
        name,
        category,
        description,
        color,
        primary_agents: &[],
        secondary_agents: &[],
    }
}

/// Every label in declaration order. Order is significant: it breaks ties in
/// suggestion ranking and fixes the `list` output.
static LABELS: &[LabelDefinition] = &[
    // Domain
    domain(
        "frontend",
        "User interface, components, styling and client-side state",
        "#3B82F6",
        &[FrontendDeveloper],
        &[TestAutomator, PerformanceEngineer],
    ),
    domain(
        "backend",
        "Server-side services, business logic and integrations",
        "#10B981",
        &[BackendArchitect],
        &[ApiDesigner, DatabaseArchitect],
    ),
    domain(
        "api",
        "API contracts, endpoints and versioning",
        "#06B6D4",
        &[ApiDesigner, BackendArchitect],
        &[DocsWriter],
    ),
    domain(
        "database",
        "Schemas, migrations, queries and data integrity",
        "#8B5CF6",
        &[DatabaseArchitect, BackendArchitect],
        &[PerformanceEngineer],
    ),
    domain(
        "security",
        "Authentication, authorization, secrets and vulnerabilities",
        "#EF4444",
        &[SecurityManager],
        &[BackendArchitect, DevopsEngineer],
    ),
    domain(
        "testing",
        "Test suites, coverage and test infrastructure",
        "#F59E0B",
        &[TestAutomator],
        &[CodeReviewer],
    ),
    domain(
        "devops",
        "CI/CD pipelines, deployment and infrastructure",
        "#6366F1",
        &[DevopsEngineer],
        &[SecurityManager],
    ),
    domain(
        "performance",
        "Latency, throughput, memory and profiling",
        "#F97316",
        &[PerformanceEngineer],
        &[BackendArchitect, DatabaseArchitect],
    ),
    domain(
        "documentation",
        "Guides, references, READMEs and inline docs",
        "#64748B",
        &[DocsWriter],
        &[ApiDesigner],
    ),
    domain(
        "mobile",
        "iOS and Android clients",
        "#EC4899",
        &[MobileDeveloper],
        &[FrontendDeveloper, TestAutomator],
    ),
    domain(
        "ai",
        "Models, prompts, embeddings and inference pipelines",
        "#14B8A6",
        &[MlEngineer],
        &[BackendArchitect],
    ),
    // Type
    plain(Category::Type, "feature", "New functionality", "#22C55E"),
    plain(Category::Type, "bug", "Something is broken", "#DC2626"),
    plain(
        Category::Type,
        "refactor",
        "Restructuring without behavior change",
        "#A855F7",
    ),
    plain(
        Category::Type,
        "chore",
        "Maintenance, dependencies and tooling",
        "#78716C",
    ),
    plain(
        Category::Type,
        "spike",
        "Time-boxed research or prototype",
        "#EAB308",
    ),
    // Scope
    plain(
        Category::Scope,
        "breaking-change",
        "Changes a public contract; requires coordination",
        "#B91C1C",
    ),
    plain(
        Category::Scope,
        "tech-debt",
        "Pays down accumulated shortcuts",
        "#92400E",
    ),
    plain(
        Category::Scope,
        "blocked",
        "Waiting on an external dependency",
        "#F43F5E",
    ),
    plain(
        Category::Scope,
        "needs-discussion",
        "Requires a design decision before work starts",
        "#0EA5E9",
    ),
    plain(
        Category::Scope,
        "quick-win",
        "Small, low-risk change with visible payoff",
        "#84CC16",
    ),
];

/// Process-wide, immutable taxonomy instance.
pub static TAXONOMY: LazyLock<Taxonomy> = LazyLock::new(|| Taxonomy::from_definitions(LABELS));

/// Label catalog split into disjoint per-category lists.
#[derive(Debug)]
pub struct Taxonomy {
    all: &'static [LabelDefinition],
    domain: Vec<&'static LabelDefinition>,
    kind: Vec<&'static LabelDefinition>,
    scope: Vec<&'static LabelDefinition>,
    by_name: HashMap<&'static str, &'static LabelDefinition>,
}

impl Taxonomy {
    fn from_definitions(defs: &'static [LabelDefinition]) -> Self {
        let mut taxonomy = Self {
            all: defs,
            domain: Vec::new(),
            kind: Vec::new(),
            scope: Vec::new(),
            by_name: HashMap::with_capacity(defs.len()),
        };

        for def in defs {
            debug_assert_eq!(def.name, def.name.to_lowercase());
            let previous = taxonomy.by_name.insert(def.name, def);
            debug_assert!(previous.is_none(), "duplicate taxonomy label {}", def.name);
            match def.category {
                Category::Domain => taxonomy.domain.push(def),
                Category::Type => taxonomy.kind.push(def),
                Category::Scope => taxonomy.scope.push(def),
            }
        }

        taxonomy
    }

    /// Look up a label by name, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'static LabelDefinition> {
        self.by_name.get(normalize(name).as_str()).copied()
    }

    #[must_use]
    pub fn category_of(&self, name: &str) -> Option<Category> {
        self.get(name).map(|def| def.category)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Labels of one category, in declaration order.
    #[must_use]
    pub fn labels(&self, category: Category) -> &[&'static LabelDefinition] {
        match category {
            Category::Domain => &self.domain,
            Category::Type => &self.kind,
            Category::Scope => &self.scope,
        }
    }

    /// Every label, in declaration order.
    pub fn all(&self) -> impl Iterator<Item = &'static LabelDefinition> {
        self.all.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Remote color for a label; gray for names outside the taxonomy.
    #[must_use]
    pub fn color_for(&self, name: &str) -> &'static str {
        self.get(name).map_or(DEFAULT_LABEL_COLOR, |def| def.color)
    }

    /// Domain labels where `agent` is a primary owner.
    #[must_use]
    pub fn domain_labels_for_agent(&self, agent: AgentId) -> Vec<&'static str> {
        self.domain
            .iter()
            .filter(|def| def.primary_agents.contains(&agent))
            .map(|def| def.name)
            .collect()
    }

    /// Comma-separated names of a category, for error messages.
    #[must_use]
    pub fn names(&self, category: Category) -> String {
        self.labels(category)
            .iter()
            .map(|def| def.name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let def = TAXONOMY.get("SECURITY").unwrap();
        assert_eq!(def.name, "security");
        assert_eq!(TAXONOMY.category_of(" Bug "), Some(Category::Type));
        assert_eq!(TAXONOMY.category_of("Tech-Debt"), Some(Category::Scope));
        assert!(TAXONOMY.get("wontfix").is_none());
    }

    #[test]
    fn test_categories_are_disjoint_and_complete() {
        let total: usize = Category::ALL
            .iter()
            .map(|c| TAXONOMY.labels(*c).len())
            .sum();
        assert_eq!(total, TAXONOMY.len());
        assert_eq!(TAXONOMY.labels(Category::Type).len(), 5);
        for category in Category::ALL {
            assert!(TAXONOMY
                .labels(category)
                .iter()
                .all(|def| def.category == category));
        }
    }

    #[test]
    fn test_only_domain_labels_have_agents() {
        for def in TAXONOMY.all() {
            if def.category == Category::Domain {
                assert!(!def.primary_agents.is_empty(), "{} has no owner", def.name);
            } else {
                assert!(def.primary_agents.is_empty());
                assert!(def.secondary_agents.is_empty());
            }
        }
    }

    #[test]
    fn test_primary_and_secondary_never_overlap_per_label() {
        for def in TAXONOMY.all() {
            for agent in def.secondary_agents {
                assert!(!def.primary_agents.contains(agent), "{}: {agent}", def.name);
            }
        }
    }

    #[test]
    fn test_color_for_unknown_is_gray() {
        assert_eq!(TAXONOMY.color_for("security"), "#EF4444");
        assert_eq!(TAXONOMY.color_for("customer-escalation"), DEFAULT_LABEL_COLOR);
    }

    #[test]
    fn test_colors_are_hex() {
        for def in TAXONOMY.all() {
            assert!(def.color.starts_with('#') && def.color.len() == 7, "{}", def.name);
        }
    }

    #[test]
    fn test_domain_labels_for_agent() {
        let labels = TAXONOMY.domain_labels_for_agent(AgentId::BackendArchitect);
        assert_eq!(labels, vec!["backend", "api", "database"]);
        assert_eq!(
            TAXONOMY.domain_labels_for_agent(AgentId::SecurityManager),
            vec!["security"]
        );
    }
}
