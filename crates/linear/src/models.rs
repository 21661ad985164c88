//! Linear entity type definitions.
//!
//! These mirror remote state for the lifetime of a single call. The tracker is
//! the system of record; nothing here is cached across invocations.

use serde::{Deserialize, Serialize};

/// Maximum length of a project's short description on the remote side.
pub const PROJECT_DESCRIPTION_LIMIT: usize = 255;

/// Linear team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    /// Unique identifier
    pub id: String,
    /// Team name
    pub name: String,
    /// Team key (used in issue identifiers)
    pub key: String,
}

/// Linear workflow state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    /// Unique identifier
    pub id: String,
    /// State name (e.g., "In Progress")
    pub name: String,
    /// State type: backlog, unstarted, started, completed, canceled
    #[serde(rename = "type")]
    pub state_type: String,
    /// Position for ordering
    #[serde(default)]
    pub position: f64,
}

/// Linear issue label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    /// Unique identifier
    pub id: String,
    /// Label name
    pub name: String,
    /// Label color
    #[serde(default)]
    pub color: Option<String>,
}

/// Linear project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique identifier
    pub id: String,
    /// Project name
    pub name: String,
    /// Short description (plain text, limited length)
    #[serde(default)]
    pub description: Option<String>,
    /// Long-form content (markdown)
    #[serde(default)]
    pub content: Option<String>,
    /// URL to the project
    #[serde(default)]
    pub url: Option<String>,
    /// Project state (planned, started, ...)
    #[serde(default)]
    pub state: Option<String>,
}

impl Project {
    /// Whether the project carries a non-blank description or content.
    #[must_use]
    pub fn has_description(&self) -> bool {
        let filled = |s: &Option<String>| s.as_deref().is_some_and(|v| !v.trim().is_empty());
        filled(&self.description) || filled(&self.content)
    }
}

/// Linear initiative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Initiative {
    /// Unique identifier
    pub id: String,
    /// Initiative name
    pub name: String,
}

/// Linear issue, as far as label hygiene needs it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Unique identifier
    pub id: String,
    /// Human-readable identifier (e.g., "ENG-42")
    pub identifier: String,
    /// Issue title
    pub title: String,
    /// URL to the issue
    #[serde(default)]
    pub url: Option<String>,
    /// Labels on the issue
    #[serde(default)]
    pub labels: Vec<Label>,
}

/// Input for creating an issue label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelCreateInput {
    /// Team that owns the label
    pub team_id: String,
    /// Label name
    pub name: String,
    /// Hex color code
    pub color: String,
    /// Label description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Input for creating a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCreateInput {
    /// Project name
    pub name: String,
    /// Team IDs to associate with the project
    pub team_ids: Vec<String>,
    /// Short description, at most [`PROJECT_DESCRIPTION_LIMIT`] characters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Project state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Input for updating a project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdateInput {
    /// New short description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New long-form content (markdown)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// New state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl ProjectUpdateInput {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.content.is_none() && self.state.is_none()
    }
}

/// Input for creating an issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCreateInput {
    /// Team ID
    pub team_id: String,
    /// Issue title
    pub title: String,
    /// Issue description (markdown)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Priority (0 = none, 1 = urgent, 2 = high, 3 = normal, 4 = low)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    /// Estimate in team points
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<i32>,
    /// Label IDs to apply
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub label_ids: Vec<String>,
    /// Project ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Workflow state ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
}

/// Truncate to at most `limit` characters, respecting char boundaries.
#[must_use]
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
