//! Narrow, typed seam over the remote issue tracker.
//!
//! Exposes only the operations label hygiene and project provisioning need.
//! [`LinearClient`](crate::LinearClient) implements it over GraphQL; tests
//! substitute in-memory fakes or mocks.

use async_trait::async_trait;

use crate::error::TrackerResult;
use crate::models::{
    Initiative, Issue, IssueCreateInput, Label, LabelCreateInput, Project, ProjectCreateInput,
    ProjectUpdateInput, Team, WorkflowState,
};

/// Remote tracker operations.
///
/// Every method is a single remote round trip. Errors are already classified
/// into [`TrackerError`](crate::TrackerError) kinds.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Tracker: Send + Sync {
    // =========================================================================
    // Teams
    // =========================================================================

    /// Look up a team by ID. Missing teams are `NotFound`.
    async fn find_team(&self, team_id: &str) -> TrackerResult<Team>;

    /// Workflow states configured for a team.
    async fn workflow_states(&self, team_id: &str) -> TrackerResult<Vec<WorkflowState>>;

    // =========================================================================
    // Labels
    // =========================================================================

    /// Every issue label visible to a team.
    async fn list_labels(&self, team_id: &str) -> TrackerResult<Vec<Label>>;

    /// Create a label. A name collision is reported as `Duplicate`.
    async fn create_label(&self, input: LabelCreateInput) -> TrackerResult<Label>;

    // =========================================================================
    // Projects and initiatives
    // =========================================================================

    /// Projects whose name contains `name`, ignoring case.
    async fn search_projects(&self, name: &str) -> TrackerResult<Vec<Project>>;

    async fn create_project(&self, input: ProjectCreateInput) -> TrackerResult<Project>;

    async fn update_project(
        &self,
        project_id: &str,
        input: ProjectUpdateInput,
    ) -> TrackerResult<Project>;

    /// Link a project to an initiative. An existing link is `Duplicate`.
    async fn link_project_to_initiative(
        &self,
        project_id: &str,
        initiative_id: &str,
    ) -> TrackerResult<()>;

    /// Initiatives a project is linked to.
    async fn project_initiatives(&self, project_id: &str) -> TrackerResult<Vec<Initiative>>;

    /// Projects linked to an initiative.
    async fn initiative_projects(&self, initiative_id: &str) -> TrackerResult<Vec<Project>>;

    // =========================================================================
    // Issues
    // =========================================================================

    /// Issues in a project, with their labels.
    async fn project_issues(&self, project_id: &str) -> TrackerResult<Vec<Issue>>;

    async fn create_issue(&self, input: IssueCreateInput) -> TrackerResult<Issue>;

    /// Current labels of an issue.
    async fn issue_labels(&self, issue_id: &str) -> TrackerResult<Vec<Label>>;

    /// Replace an issue's labels with exactly `label_ids`.
    async fn set_issue_labels(&self, issue_id: &str, label_ids: Vec<String>) -> TrackerResult<()>;
}
