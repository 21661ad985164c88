//! Label-driven agent routing.
//!
//! Maps the Domain labels of an issue to ranked automation agents. An agent
//! that is primary owner of several of the issue's domains outranks one that
//! owns a single domain. Routing always produces an assignment: issues with no
//! Domain label go to the general pool.

use serde::Serialize;
use tracing::debug;

use crate::label::{AgentId, Category, TaxonomyLabel};

/// Primary agents used when an issue carries no Domain label.
pub const GENERAL_POOL_PRIMARY: &[AgentId] = &[AgentId::CodeReviewer];

/// Secondary agents used when an issue carries no Domain label.
pub const GENERAL_POOL_SECONDARY: &[AgentId] =
    &[AgentId::BackendArchitect, AgentId::FrontendDeveloper];

/// Routing decision for one label set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentSelection {
    /// Ranked, best first
    pub primary: Vec<AgentId>,
    /// Fallback owners; never overlaps `primary`
    pub secondary: Vec<AgentId>,
    /// Domain labels that drove the decision (canonical names)
    pub labels: Vec<&'static str>,
    /// Human-readable explanation of the decision
    pub reasoning: String,
}

impl AgentSelection {
    /// Best-ranked primary agent.
    #[must_use]
    pub fn top(&self) -> Option<AgentId> {
        self.primary.first().copied()
    }

    /// Whether this selection came from the general pool fallback.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.labels.is_empty()
    }

    fn general_pool() -> Self {
        Self {
            primary: GENERAL_POOL_PRIMARY.to_vec(),
            secondary: GENERAL_POOL_SECONDARY.to_vec(),
            labels: Vec::new(),
            reasoning: format!(
                "No domain labels found; routed to general pool ({})",
                join(GENERAL_POOL_PRIMARY)
            ),
        }
    }
}

/// Route a label set to agents.
///
/// Only Domain labels are considered; lookups are case-insensitive and
/// repeated labels count once. Agents tied on match count keep first-seen
/// order (input label order, then the label's owner order).
#[must_use]
pub fn route<S: AsRef<str>>(labels: &[S]) -> AgentSelection {
    let mut domains: Vec<TaxonomyLabel> = Vec::new();
    for raw in labels {
        if let Some(label) = TaxonomyLabel::parse(raw.as_ref()) {
            if label.category == Category::Domain && !domains.contains(&label) {
                domains.push(label);
            }
        }
    }

    if domains.is_empty() {
        debug!("No domain labels in {} label(s), using general pool", labels.len());
        return AgentSelection::general_pool();
    }

    let mut counts: Vec<(AgentId, usize)> = Vec::new();
    let mut secondary: Vec<AgentId> = Vec::new();

    for label in &domains {
        let def = label.definition();
        for agent in def.primary_agents {
            match counts.iter_mut().find(|(a, _)| a == agent) {
                Some((_, count)) => *count += 1,
                None => counts.push((*agent, 1)),
            }
        }
        for agent in def.secondary_agents {
            if !secondary.contains(agent) {
                secondary.push(*agent);
            }
        }
    }

    // Stable: ties keep first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let primary: Vec<AgentId> = counts.iter().map(|(agent, _)| *agent).collect();
    secondary.retain(|agent| !primary.contains(agent));

    let names: Vec<&'static str> = domains.iter().map(|label| label.name).collect();
    let reasoning = if domains.len() == 1 {
        format!("Single domain match: {} -> {}", names[0], join(&primary))
    } else {
        let (winner, matched) = counts[0];
        format!(
            "Multi-domain match ({}): {winner} is primary for {matched} of {} domains",
            names.join(", "),
            domains.len()
        )
    };

    debug!(top = %primary[0], domains = names.len(), "Routed label set");

    AgentSelection {
        primary,
        secondary,
        labels: names,
        reasoning,
    }
}

fn join(agents: &[AgentId]) -> String {
    agents
        .iter()
        .map(|a| a.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
