//! Keyword-based label suggestion.
//!
//! Scores free text (issue title plus optional description) against a fixed
//! keyword list per taxonomy label. Matching is plain substring search on the
//! lowercased text, so results are reproducible for a given input.

use serde::Serialize;

use crate::label::Category;
use crate::registry::TAXONOMY;

/// Upper bound on any suggestion's confidence.
pub const MAX_CONFIDENCE: f64 = 0.95;

/// Per-category caps applied after ranking.
const MAX_TYPE_SUGGESTIONS: usize = 1;
const MAX_DOMAIN_SUGGESTIONS: usize = 2;
const MAX_SCOPE_SUGGESTIONS: usize = 2;

/// Keywords per label. Every taxonomy label has an entry.
static KEYWORDS: &[(&str, &[&str])] = &[
    // Domain
    (
        "frontend",
        &[
            "frontend",
            "user interface",
            "component",
            "css",
            "react",
            "button",
            "layout",
            "style",
            "responsive",
            "browser",
        ],
    ),
    (
        "backend",
        &[
            "backend",
            "server",
            "service",
            "queue",
            "worker",
            "business logic",
            "microservice",
            "cron",
            "webhook",
        ],
    ),
    (
        "api",
        &[
            "api",
            "endpoint",
            "rest api",
            "graphql",
            "grpc",
            "openapi",
            "request",
            "response",
            "rate limit",
        ],
    ),
    (
        "database",
        &[
            "database",
            "sql",
            "query",
            "migration",
            "schema",
            "index",
            "postgres",
            "table",
            "transaction",
        ],
    ),
    (
        "security",
        &[
            "security",
            "auth",
            "authentication",
            "authorization",
            "token",
            "vulnerability",
            "xss",
            "csrf",
            "injection",
            "encrypt",
            "permission",
            "secret",
            "leak",
            "cve",
            "password",
            "oauth",
        ],
    ),
    (
        "testing",
        &[
            "test",
            "coverage",
            "unit test",
            "integration test",
            "e2e",
            "flaky",
            "mock",
            "fixture",
            "assertion",
        ],
    ),
    (
        "devops",
        &[
            "deploy",
            "ci/cd",
            "pipeline",
            "docker",
            "kubernetes",
            "helm",
            "terraform",
            "infrastructure",
            "github actions",
            "monitoring",
        ],
    ),
    (
        "performance",
        &[
            "performance",
            "slow",
            "latency",
            "optimize",
            "memory",
            "cpu",
            "cache",
            "throughput",
            "profiling",
            "benchmark",
        ],
    ),
    (
        "documentation",
        &[
            "docs",
            "documentation",
            "readme",
            "guide",
            "tutorial",
            "changelog",
            "example",
            "docstring",
        ],
    ),
    (
        "mobile",
        &[
            "mobile",
            "ios",
            "android",
            "react native",
            "swift",
            "kotlin",
            "app store",
            "tablet",
        ],
    ),
    (
        "ai",
        &[
            "llm",
            "prompt",
            "embedding",
            "machine learning",
            "inference",
            "fine-tune",
            "neural",
            "classifier",
            "vector search",
        ],
    ),
    // Type
    (
        "feature",
        &[
            "add",
            "implement",
            "new",
            "feature",
            "support",
            "create",
            "introduce",
            "enable",
            "allow",
        ],
    ),
    (
        "bug",
        &[
            "fix",
            "bug",
            "broken",
            "crash",
            "error",
            "regression",
            "fail",
            "incorrect",
            "leak",
            "wrong",
            "defect",
            "not working",
        ],
    ),
    (
        "refactor",
        &[
            "refactor",
            "restructure",
            "clean up",
            "simplify",
            "reorganize",
            "rename",
            "extract",
            "decouple",
            "consolidate",
        ],
    ),
    (
        "chore",
        &[
            "chore",
            "bump",
            "upgrade",
            "dependency",
            "dependencies",
            "maintenance",
            "tooling",
            "lint",
            "config",
            "release",
        ],
    ),
    (
        "spike",
        &[
            "spike",
            "investigate",
            "research",
            "explore",
            "prototype",
            "evaluate",
            "proof of concept",
            "feasibility",
        ],
    ),
    // Scope
    (
        "breaking-change",
        &[
            "breaking",
            "backwards incompatible",
            "deprecate",
            "remove support",
            "migration guide",
            "major version",
        ],
    ),
    (
        "tech-debt",
        &[
            "tech debt",
            "technical debt",
            "legacy",
            "workaround",
            "hack",
            "cleanup",
            "outdated",
        ],
    ),
    (
        "blocked",
        &["blocked", "waiting on", "depends on", "blocker", "on hold"],
    ),
    (
        "needs-discussion",
        &[
            "discuss",
            "proposal",
            "rfc",
            "decision",
            "design review",
            "open question",
            "trade-off",
        ],
    ),
    (
        "quick-win",
        &["quick", "small", "trivial", "easy", "typo", "minor", "one-line"],
    ),
];

/// A proposed label for a piece of free text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelSuggestion {
    pub label: &'static str,
    pub category: Category,
    /// In `[0, MAX_CONFIDENCE]`
    pub confidence: f64,
    pub reason: String,
}

/// Keywords configured for a label, if any.
#[must_use]
pub fn keywords_for(label: &str) -> Option<&'static [&'static str]> {
    KEYWORDS
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, keywords)| *keywords)
}

/// Confidence for `matches` hits out of `keyword_count` configured keywords.
///
/// Rewards both dense and repeated matching, capped at [`MAX_CONFIDENCE`].
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn confidence(matches: usize, keyword_count: usize) -> f64 {
    if matches == 0 || keyword_count == 0 {
        return 0.0;
    }
    let ratio = matches as f64 / keyword_count as f64;
    let score = ratio * 2.0 + (matches - 1) as f64 * 0.1;
    score.min(MAX_CONFIDENCE)
}

/// Suggest labels for an issue title and optional description.
///
/// Candidates are ranked by confidence (ties keep taxonomy declaration order)
/// and then capped per category: at most one Type, two Domain and two Scope
/// labels.
#[must_use]
pub fn suggest(title: &str, description: Option<&str>) -> Vec<LabelSuggestion> {
    let text = match description {
        Some(desc) => format!("{title} {desc}"),
        None => title.to_string(),
    }
    .to_lowercase();

    let mut candidates: Vec<LabelSuggestion> = TAXONOMY
        .all()
        .filter_map(|def| {
            let keywords = keywords_for(def.name)?;
            let matched: Vec<&str> = keywords
                .iter()
                .copied()
                .filter(|kw| text.contains(kw))
                .collect();
            if matched.is_empty() {
                return None;
            }
            Some(LabelSuggestion {
                label: def.name,
                category: def.category,
                confidence: confidence(matched.len(), keywords.len()),
                reason: format!("matched keywords: {}", matched.join(", ")),
            })
        })
        .collect();

    // Stable sort: equal confidences keep declaration order
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut taken = [0usize; 3];
    candidates
        .into_iter()
        .filter(|candidate| {
            let (slot, cap) = match candidate.category {
                Category::Type => (0, MAX_TYPE_SUGGESTIONS),
                Category::Domain => (1, MAX_DOMAIN_SUGGESTIONS),
                Category::Scope => (2, MAX_SCOPE_SUGGESTIONS),
            };
            if taken[slot] < cap {
                taken[slot] += 1;
                true
            } else {
                false
            }
        })
        .collect()
}
