//! Best-effort, multi-step project provisioning.
//!
//! Each step is attempted and reported independently. Nothing is rolled back:
//! the returned [`CreateResult`] states exactly what happened, and re-running
//! the same [`ProjectConfig`] converges on the same remote state.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::cache::{LabelMap, LookupCache};
use crate::error::TrackerResult;
use crate::models::{
    truncate_chars, Issue, IssueCreateInput, Project, ProjectCreateInput, ProjectUpdateInput,
    Team, PROJECT_DESCRIPTION_LIMIT,
};
use crate::sync::{EnsureOptions, EnsureResult, LabelPolicy, LabelSynchronizer};
use crate::tracker::Tracker;
use crate::verify::{ExpectedLabels, ProjectVerification, Verifier};

/// Desired state of one project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub name: String,
    /// Short description; truncated to the remote limit
    #[serde(default)]
    pub description: Option<String>,
    /// Long-form markdown content
    #[serde(default)]
    pub content: Option<String>,
    /// Project state (planned, started, ...)
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub initiative_id: Option<String>,
    #[serde(default)]
    pub issues: Vec<IssueConfig>,
    #[serde(default)]
    pub label_policy: LabelPolicy,
}

impl ProjectConfig {
    /// Distinct label names across all issues, in first-seen order.
    #[must_use]
    pub fn distinct_labels(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.issues
            .iter()
            .flat_map(|issue| issue.labels.iter())
            .map(|label| label.trim())
            .filter(|label| !label.is_empty() && seen.insert(label.to_lowercase()))
            .map(str::to_string)
            .collect()
    }

    /// Labels each issue is expected to carry, in configuration order.
    #[must_use]
    pub fn expected_labels(&self) -> ExpectedLabels {
        self.issues
            .iter()
            .map(|issue| (issue.title.clone(), issue.labels.clone()))
            .collect()
    }
}

/// Desired state of one issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueConfig {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub estimate: Option<i32>,
    /// Workflow state name (e.g. "Todo")
    #[serde(default)]
    pub state: Option<String>,
}

/// The provisioning steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Project,
    Initiative,
    Content,
    Labels,
    Issues,
    Verify,
}

impl Step {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Initiative => "initiative",
            Self::Content => "content",
            Self::Labels => "labels",
            Self::Issues => "issues",
            Self::Verify => "verify",
        }
    }
}

/// What happened in one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum StepOutcome {
    Done,
    /// Remote state already matched; nothing was written
    AlreadyDone,
    Skipped(String),
    Failed(String),
}

impl StepOutcome {
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: Step,
    pub outcome: StepOutcome,
}

/// An issue that exists after provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRecord {
    pub id: String,
    pub identifier: String,
    pub title: String,
    pub url: Option<String>,
    /// Configured labels that could not be resolved to an ID
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved_labels: Vec<String>,
}

impl IssueRecord {
    fn new(issue: Issue, unresolved_labels: Vec<String>) -> Self {
        Self {
            id: issue.id,
            identifier: issue.identifier,
            title: issue.title,
            url: issue.url,
            unresolved_labels,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedIssue {
    pub title: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssueResults {
    pub created: Vec<IssueRecord>,
    /// Issues found by title and reused
    pub existing: Vec<IssueRecord>,
    pub failed: Vec<FailedIssue>,
}

/// Everything one provisioning run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResult {
    pub project: Option<Project>,
    pub steps: Vec<StepReport>,
    pub labels: EnsureResult,
    pub issues: IssueResults,
    pub verification: ProjectVerification,
}

impl CreateResult {
    #[must_use]
    pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|report| report.step == step)
            .map(|report| &report.outcome)
    }

    /// True when no step failed and verification passed.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.verification.overall.passed && !self.steps.iter().any(|r| r.outcome.is_failed())
    }
}

/// Drives project creation end to end.
pub struct ProjectProvisioner<'a, T: Tracker + ?Sized> {
    tracker: &'a T,
}

impl<'a, T: Tracker + ?Sized> ProjectProvisioner<'a, T> {
    #[must_use]
    pub fn new(tracker: &'a T) -> Self {
        Self { tracker }
    }

    /// Create or converge a project from `config`.
    ///
    /// Steps: find-or-create the project, link the initiative, set content,
    /// sync labels, find-or-create issues, verify. A failing step is recorded
    /// and later steps that depend on it are skipped; verification always runs.
    ///
    /// # Errors
    /// Only a failed team lookup is fatal.
    #[instrument(skip(self, config), fields(team_id = %team_id, project = %config.name))]
    pub async fn create_project(
        &self,
        team_id: &str,
        config: &ProjectConfig,
    ) -> TrackerResult<CreateResult> {
        let mut cache = LookupCache::new();
        let team = cache.team(self.tracker, team_id).await?;
        let mut steps = Vec::with_capacity(6);

        // 1. Project
        let (project, outcome) = self.find_or_create_project(&team, config).await;
        steps.push(StepReport {
            step: Step::Project,
            outcome,
        });

        // 2. Initiative link
        steps.push(StepReport {
            step: Step::Initiative,
            outcome: self.link_initiative(project.as_ref(), config).await,
        });

        // 3. Content
        steps.push(StepReport {
            step: Step::Content,
            outcome: self.update_content(project.as_ref(), config).await,
        });

        // 4. Labels
        let (labels, outcome) = self.sync_labels(&team, config).await;
        steps.push(StepReport {
            step: Step::Labels,
            outcome,
        });

        // 5. Issues
        let (issues, outcome) = self
            .create_issues(&team, project.as_ref(), config, &labels.label_map, &mut cache)
            .await;
        steps.push(StepReport {
            step: Step::Issues,
            outcome,
        });

        // 6. Verify
        let verification = match Verifier::new(self.tracker)
            .verify_project_creation(
                &config.name,
                config.issues.len(),
                Some(&config.expected_labels()),
                config.initiative_id.as_deref(),
            )
            .await
        {
            Ok(verification) => {
                steps.push(StepReport {
                    step: Step::Verify,
                    outcome: StepOutcome::Done,
                });
                verification
            }
            Err(err) => {
                warn!(error = %err, "Verification could not run");
                steps.push(StepReport {
                    step: Step::Verify,
                    outcome: StepOutcome::Failed(err.to_string()),
                });
                ProjectVerification::unavailable(&config.name, &err)
            }
        };

        info!(
            created = issues.created.len(),
            existing = issues.existing.len(),
            failed = issues.failed.len(),
            passed = verification.overall.passed,
            "Provisioning finished"
        );

        Ok(CreateResult {
            project,
            steps,
            labels,
            issues,
            verification,
        })
    }

    async fn find_or_create_project(
        &self,
        team: &Team,
        config: &ProjectConfig,
    ) -> (Option<Project>, StepOutcome) {
        let name = config.name.trim();
        match self.tracker.search_projects(name).await {
            Ok(found) => {
                if let Some(project) = found.into_iter().find(|p| p.name.trim() == name) {
                    info!(project_id = %project.id, "Reusing existing project");
                    return (Some(project), StepOutcome::AlreadyDone);
                }
            }
            Err(err) => {
                warn!(error = %err, "Project lookup failed");
                return (None, StepOutcome::Failed(err.to_string()));
            }
        }

        let input = ProjectCreateInput {
            name: name.to_string(),
            team_ids: vec![team.id.clone()],
            description: config
                .description
                .as_deref()
                .map(|d| truncate_chars(d, PROJECT_DESCRIPTION_LIMIT)),
            state: config.state.clone(),
        };
        match self.tracker.create_project(input).await {
            Ok(project) => {
                info!(project_id = %project.id, "Created project");
                (Some(project), StepOutcome::Done)
            }
            Err(err) => {
                warn!(error = %err, "Project creation failed");
                (None, StepOutcome::Failed(err.to_string()))
            }
        }
    }

    async fn link_initiative(&self, project: Option<&Project>, config: &ProjectConfig) -> StepOutcome {
        let Some(initiative_id) = config.initiative_id.as_deref() else {
            return StepOutcome::Skipped("no initiative configured".to_string());
        };
        let Some(project) = project else {
            return StepOutcome::Skipped("project unavailable".to_string());
        };

        match self
            .tracker
            .link_project_to_initiative(&project.id, initiative_id)
            .await
        {
            Ok(()) => {
                info!(initiative_id, "Linked project to initiative");
                StepOutcome::Done
            }
            Err(err) if err.is_duplicate() => {
                info!(initiative_id, "Project already linked to initiative");
                StepOutcome::AlreadyDone
            }
            Err(err) => {
                warn!(initiative_id, error = %err, "Initiative link failed");
                StepOutcome::Failed(err.to_string())
            }
        }
    }

    async fn update_content(&self, project: Option<&Project>, config: &ProjectConfig) -> StepOutcome {
        let Some(project) = project else {
            return StepOutcome::Skipped("project unavailable".to_string());
        };

        let description = config
            .description
            .as_deref()
            .map(|d| truncate_chars(d, PROJECT_DESCRIPTION_LIMIT));
        let mut input = ProjectUpdateInput::default();
        if description.is_some() && description != project.description {
            input.description = description;
        }
        if config.content.is_some() && config.content != project.content {
            input.content.clone_from(&config.content);
        }

        if input.is_empty() {
            return if config.description.is_none() && config.content.is_none() {
                StepOutcome::Skipped("no content configured".to_string())
            } else {
                StepOutcome::AlreadyDone
            };
        }

        match self.tracker.update_project(&project.id, input).await {
            Ok(_) => {
                info!(project_id = %project.id, "Updated project content");
                StepOutcome::Done
            }
            Err(err) => {
                warn!(error = %err, "Project content update failed");
                StepOutcome::Failed(err.to_string())
            }
        }
    }

    async fn sync_labels(&self, team: &Team, config: &ProjectConfig) -> (EnsureResult, StepOutcome) {
        let names = config.distinct_labels();
        if names.is_empty() {
            return (
                EnsureResult::default(),
                StepOutcome::Skipped("no labels configured".to_string()),
            );
        }

        let opts = EnsureOptions {
            policy: config.label_policy,
        };
        match LabelSynchronizer::new(self.tracker)
            .ensure_labels_exist(&team.id, &names, opts)
            .await
        {
            Ok(result) => {
                let outcome = if !result.failed.is_empty() {
                    StepOutcome::Failed(format!(
                        "{} of {} labels failed",
                        result.failed.len(),
                        names.len()
                    ))
                } else if result.created.is_empty() {
                    StepOutcome::AlreadyDone
                } else {
                    StepOutcome::Done
                };
                (result, outcome)
            }
            Err(err) => {
                warn!(error = %err, "Label sync failed");
                (EnsureResult::default(), StepOutcome::Failed(err.to_string()))
            }
        }
    }

    async fn create_issues(
        &self,
        team: &Team,
        project: Option<&Project>,
        config: &ProjectConfig,
        label_map: &LabelMap,
        cache: &mut LookupCache,
    ) -> (IssueResults, StepOutcome) {
        let mut results = IssueResults::default();
        if config.issues.is_empty() {
            return (results, StepOutcome::Skipped("no issues configured".to_string()));
        }
        let Some(project) = project else {
            return (results, StepOutcome::Skipped("project unavailable".to_string()));
        };

        // Issues that predate this run. Each match is consumed so repeated titles
        // pair up one-to-one with remote issues.
        let mut unmatched = match self.tracker.project_issues(&project.id).await {
            Ok(issues) => issues,
            Err(err) => {
                warn!(error = %err, "Could not read existing project issues");
                return (results, StepOutcome::Failed(err.to_string()));
            }
        };

        let sync = LabelSynchronizer::new(self.tracker);
        for issue_config in &config.issues {
            let title = issue_config.title.trim();
            let (label_ids, unresolved) = resolve_labels(&issue_config.labels, label_map);
            for name in &unresolved {
                warn!(issue = %title, label = %name, "Label not resolved; creating issue without it");
            }

            let position = unmatched.iter().position(|i| i.title.trim() == title);
            if let Some(existing) = position.map(|index| unmatched.remove(index)) {
                if !label_map.is_empty() {
                    if let Err(err) = sync
                        .apply_labels_to_issue(&existing.id, &issue_config.labels, label_map)
                        .await
                    {
                        warn!(issue = %existing.identifier, error = %err, "Could not reconcile labels");
                        results.failed.push(FailedIssue {
                            title: title.to_string(),
                            error: format!("label update failed: {err}"),
                        });
                        continue;
                    }
                }
                results.existing.push(IssueRecord::new(existing, unresolved));
                continue;
            }

            let state_id = match issue_config.state.as_deref() {
                Some(state) => match cache.state_id(self.tracker, &team.id, state).await {
                    Ok(Some(id)) => Some(id),
                    Ok(None) => {
                        warn!(issue = %title, state, "Unknown workflow state; using team default");
                        None
                    }
                    Err(err) => {
                        warn!(issue = %title, error = %err, "Workflow state lookup failed");
                        None
                    }
                },
                None => None,
            };

            let input = IssueCreateInput {
                team_id: team.id.clone(),
                title: title.to_string(),
                description: issue_config.description.clone(),
                priority: issue_config.priority,
                estimate: issue_config.estimate,
                label_ids,
                project_id: Some(project.id.clone()),
                state_id,
            };
            match self.tracker.create_issue(input).await {
                Ok(issue) => {
                    info!(issue = %issue.identifier, "Created issue");
                    results.created.push(IssueRecord::new(issue, unresolved));
                }
                Err(err) => {
                    warn!(issue = %title, error = %err, "Issue creation failed");
                    results.failed.push(FailedIssue {
                        title: title.to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }

        let outcome = if !results.failed.is_empty() {
            StepOutcome::Failed(format!(
                "{} of {} issues failed",
                results.failed.len(),
                config.issues.len()
            ))
        } else if results.created.is_empty() {
            StepOutcome::AlreadyDone
        } else {
            StepOutcome::Done
        };
        (results, outcome)
    }
}

/// Split configured label names into resolved IDs and unresolved names.
fn resolve_labels(names: &[String], label_map: &LabelMap) -> (Vec<String>, Vec<String>) {
    let mut ids: Vec<String> = Vec::new();
    let mut unresolved = Vec::new();
    for name in names {
        match label_map.id(name) {
            Some(id) if !ids.iter().any(|existing| existing == id) => ids.push(id.to_string()),
            Some(_) => {}
            None => unresolved.push(name.clone()),
        }
    }
    (ids, unresolved)
}
