//! Core taxonomy value types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced when parsing taxonomy identifiers from strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown label category: {0}")]
    UnknownCategory(String),

    #[error("unknown agent id: {0}")]
    UnknownAgent(String),
}

/// Label category. Every taxonomy label belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Routes work to an automation agent (security, backend, ...)
    Domain,
    /// Nature of the work (feature, bug, ...); exactly one expected per issue
    Type,
    /// Cross-cutting impact flags (breaking-change, tech-debt, ...)
    Scope,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Self; 3] = [Self::Domain, Self::Type, Self::Scope];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Type => "type",
            Self::Scope => "scope",
        }
    }

    /// Human-facing name used in validation messages.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Domain => "Domain",
            Self::Type => "Type",
            Self::Scope => "Scope",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "domain" => Ok(Self::Domain),
            "type" => Ok(Self::Type),
            "scope" => Ok(Self::Scope),
            other => Err(ParseError::UnknownCategory(other.to_string())),
        }
    }
}

/// Automation agents that can own domain labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentId {
    /// UI components, styling, client-side state
    FrontendDeveloper,
    /// Services, server-side architecture
    BackendArchitect,
    /// API contracts and versioning
    ApiDesigner,
    /// Schemas, migrations, queries
    DatabaseArchitect,
    /// Auth, secrets, vulnerabilities
    SecurityManager,
    /// Test suites and coverage
    TestAutomator,
    /// CI/CD, deployment, infrastructure
    DevopsEngineer,
    /// Profiling and optimization
    PerformanceEngineer,
    /// Guides, references, READMEs
    DocsWriter,
    /// iOS and Android clients
    MobileDeveloper,
    /// Models, prompts, inference pipelines
    MlEngineer,
    /// General review and fallback owner
    CodeReviewer,
}

impl AgentId {
    pub const ALL: [Self; 12] = [
        Self::FrontendDeveloper,
        Self::BackendArchitect,
        Self::ApiDesigner,
        Self::DatabaseArchitect,
        Self::SecurityManager,
        Self::TestAutomator,
        Self::DevopsEngineer,
        Self::PerformanceEngineer,
        Self::DocsWriter,
        Self::MobileDeveloper,
        Self::MlEngineer,
        Self::CodeReviewer,
    ];

    /// Get the agent's identifier as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FrontendDeveloper => "frontend-developer",
            Self::BackendArchitect => "backend-architect",
            Self::ApiDesigner => "api-designer",
            Self::DatabaseArchitect => "database-architect",
            Self::SecurityManager => "security-manager",
            Self::TestAutomator => "test-automator",
            Self::DevopsEngineer => "devops-engineer",
            Self::PerformanceEngineer => "performance-engineer",
            Self::DocsWriter => "docs-writer",
            Self::MobileDeveloper => "mobile-developer",
            Self::MlEngineer => "ml-engineer",
            Self::CodeReviewer => "code-reviewer",
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|agent| agent.as_str() == needle)
            .ok_or(ParseError::UnknownAgent(needle))
    }
}

/// Static definition of a taxonomy label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelDefinition {
    /// Canonical (lowercase) label name
    pub name: &'static str,
    pub category: Category,
    pub description: &'static str,
    /// Hex color used when the label is created remotely
    pub color: &'static str,
    pub primary_agents: &'static [AgentId],
    pub secondary_agents: &'static [AgentId],
}

/// A label name resolved against the taxonomy.
///
/// Raw strings coming from callers are normalized into this pair as early as
/// possible so downstream code never compares user-supplied casing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TaxonomyLabel {
    pub category: Category,
    pub name: &'static str,
}

impl TaxonomyLabel {
    /// Resolve a raw label string (any casing, surrounding whitespace allowed).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        crate::registry::TAXONOMY.get(raw).map(Self::from)
    }

    /// Full definition backing this label.
    #[must_use]
    pub fn definition(self) -> &'static LabelDefinition {
        crate::registry::TAXONOMY
            .get(self.name)
            .unwrap_or_else(|| unreachable!("taxonomy label {} not registered", self.name))
    }
}

impl From<&'static LabelDefinition> for TaxonomyLabel {
    fn from(def: &'static LabelDefinition) -> Self {
        Self {
            category: def.category,
            name: def.name,
        }
    }
}

impl fmt::Display for TaxonomyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Normalize a raw label string for lookups: trimmed and lowercased.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_str() {
        assert_eq!("Domain".parse::<Category>(), Ok(Category::Domain));
        assert_eq!(" type ".parse::<Category>(), Ok(Category::Type));
        assert!(matches!(
            "severity".parse::<Category>(),
            Err(ParseError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_agent_id_round_trips_through_display() {
        for agent in AgentId::ALL {
            assert_eq!(agent.to_string().parse::<AgentId>(), Ok(agent));
        }
    }

    #[test]
    fn test_agent_id_serializes_kebab_case() {
        let json = serde_json::to_string(&AgentId::SecurityManager).unwrap();
        assert_eq!(json, "\"security-manager\"");
    }

    #[test]
    fn test_taxonomy_label_parse_normalizes() {
        let label = TaxonomyLabel::parse("  Security ").unwrap();
        assert_eq!(label.name, "security");
        assert_eq!(label.category, Category::Domain);
        assert!(TaxonomyLabel::parse("not-a-label").is_none());
    }
}
