//! Read-only consistency checks against remote state.
//!
//! The verifier never mutates anything. Gaps are data, not errors: a missing
//! project or an unlinked initiative shows up in `overall.gaps`, while a
//! failed remote read is returned as `Err`.

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::{TrackerError, TrackerResult};
use crate::models::{Issue, Project};
use crate::tracker::Tracker;

/// Expected labels per issue as `(title, labels)` pairs.
///
/// Titles may repeat; each entry is checked against a distinct remote issue.
pub type ExpectedLabels = Vec<(String, Vec<String>)>;

/// Pass/fail summary with itemized gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Overall {
    pub passed: bool,
    pub gaps: Vec<String>,
}

impl Overall {
    fn from_gaps(gaps: Vec<String>) -> Self {
        Self {
            passed: gaps.is_empty(),
            gaps,
        }
    }
}

/// Project found by the fuzzy lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCheck {
    pub id: String,
    pub name: String,
    pub url: Option<String>,
    pub has_description: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiativeCheck {
    pub initiative_id: String,
    pub linked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssueCountCheck {
    pub expected: usize,
    pub found: usize,
}

/// Label comparison for one expected issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueLabelCheck {
    pub title: String,
    /// `None` when no issue with this title exists
    pub identifier: Option<String>,
    pub missing: Vec<String>,
}

/// Report for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectVerification {
    /// Name that was looked up
    pub name: String,
    pub project: Option<ProjectCheck>,
    pub initiative: Option<InitiativeCheck>,
    pub issues: IssueCountCheck,
    pub labels: Vec<IssueLabelCheck>,
    pub overall: Overall,
}

impl ProjectVerification {
    /// A report for a verification that could not be carried out at all.
    #[must_use]
    pub fn unavailable(name: &str, err: &TrackerError) -> Self {
        Self {
            name: name.to_string(),
            project: None,
            initiative: None,
            issues: IssueCountCheck::default(),
            labels: Vec::new(),
            overall: Overall::from_gaps(vec![format!("Verification failed: {err}")]),
        }
    }
}

/// Report for every matching project of an initiative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiativeVerification {
    pub initiative_id: String,
    pub filter: Option<String>,
    pub projects: Vec<ProjectVerification>,
    pub overall: Overall,
}

/// Re-reads remote state and compares it with what was expected.
pub struct Verifier<'a, T: Tracker + ?Sized> {
    tracker: &'a T,
}

impl<'a, T: Tracker + ?Sized> Verifier<'a, T> {
    #[must_use]
    pub fn new(tracker: &'a T) -> Self {
        Self { tracker }
    }

    /// Verify that a project exists with a description, is linked to
    /// `initiative_id`, holds at least `expected_issue_count` issues, and that
    /// each issue in `expected_labels` carries its labels.
    ///
    /// The project is matched by exact name ignoring case, falling back to the
    /// first project whose name contains `name`.
    ///
    /// # Errors
    /// Returns the tracker error if any remote read fails.
    #[instrument(skip(self, expected_labels), fields(project = %name))]
    pub async fn verify_project_creation(
        &self,
        name: &str,
        expected_issue_count: usize,
        expected_labels: Option<&ExpectedLabels>,
        initiative_id: Option<&str>,
    ) -> TrackerResult<ProjectVerification> {
        let candidates = self.tracker.search_projects(name).await?;
        let Some(project) = fuzzy_match(name, candidates) else {
            info!("Project not found");
            return Ok(ProjectVerification {
                name: name.to_string(),
                project: None,
                initiative: None,
                issues: IssueCountCheck {
                    expected: expected_issue_count,
                    found: 0,
                },
                labels: Vec::new(),
                overall: Overall::from_gaps(vec![format!("Project '{name}' not found")]),
            });
        };

        let verification = self
            .check_project(name, &project, expected_issue_count, expected_labels, initiative_id)
            .await?;
        info!(
            passed = verification.overall.passed,
            gaps = verification.overall.gaps.len(),
            "Project verified"
        );
        Ok(verification)
    }

    /// Verify every project linked to an initiative whose name contains
    /// `filter` (ignoring case). Each project must have a description and at
    /// least `min_issues` issues.
    ///
    /// # Errors
    /// Returns the tracker error if any remote read fails.
    #[instrument(skip(self), fields(initiative_id = %initiative_id))]
    pub async fn verify_initiative(
        &self,
        initiative_id: &str,
        filter: Option<&str>,
        min_issues: usize,
    ) -> TrackerResult<InitiativeVerification> {
        let needle = filter.map(|f| f.trim().to_lowercase());
        let projects: Vec<Project> = self
            .tracker
            .initiative_projects(initiative_id)
            .await?
            .into_iter()
            .filter(|p| {
                needle
                    .as_deref()
                    .map_or(true, |n| p.name.to_lowercase().contains(n))
            })
            .collect();
        debug!(count = projects.len(), "Projects to verify");

        let mut reports = Vec::with_capacity(projects.len());
        for project in &projects {
            reports.push(
                self.check_project(&project.name, project, min_issues, None, Some(initiative_id))
                    .await?,
            );
        }

        let mut gaps = Vec::new();
        if reports.is_empty() {
            gaps.push(match filter {
                Some(f) => format!("No projects matching '{f}' linked to initiative {initiative_id}"),
                None => format!("No projects linked to initiative {initiative_id}"),
            });
        }
        for report in &reports {
            gaps.extend(
                report
                    .overall
                    .gaps
                    .iter()
                    .map(|gap| format!("{}: {gap}", report.name)),
            );
        }

        Ok(InitiativeVerification {
            initiative_id: initiative_id.to_string(),
            filter: filter.map(str::to_string),
            projects: reports,
            overall: Overall::from_gaps(gaps),
        })
    }

    async fn check_project(
        &self,
        name: &str,
        project: &Project,
        expected_issue_count: usize,
        expected_labels: Option<&ExpectedLabels>,
        initiative_id: Option<&str>,
    ) -> TrackerResult<ProjectVerification> {
        let mut gaps = Vec::new();

        let has_description = project.has_description();
        if !has_description {
            gaps.push(format!("Project '{}' has no description", project.name));
        }

        let initiative = match initiative_id {
            Some(initiative_id) => {
                let linked = self
                    .tracker
                    .project_initiatives(&project.id)
                    .await?
                    .iter()
                    .any(|i| i.id == initiative_id);
                if !linked {
                    gaps.push(format!("Project not linked to initiative {initiative_id}"));
                }
                Some(InitiativeCheck {
                    initiative_id: initiative_id.to_string(),
                    linked,
                })
            }
            None => None,
        };

        let issues = self.tracker.project_issues(&project.id).await?;
        if issues.len() < expected_issue_count {
            gaps.push(format!(
                "Expected at least {expected_issue_count} issues, found {}",
                issues.len()
            ));
        }

        let mut labels = Vec::new();
        if let Some(expected) = expected_labels {
            let mut unmatched: Vec<&Issue> = issues.iter().collect();
            for (title, wanted) in expected {
                let check = self.check_issue_labels(title, wanted, &mut unmatched).await?;
                match &check.identifier {
                    None => gaps.push(format!("Issue '{title}' not found")),
                    Some(identifier) if !check.missing.is_empty() => gaps.push(format!(
                        "Issue {identifier} '{title}' missing labels: {}",
                        check.missing.join(", ")
                    )),
                    Some(_) => {}
                }
                labels.push(check);
            }
        }

        Ok(ProjectVerification {
            name: name.to_string(),
            project: Some(ProjectCheck {
                id: project.id.clone(),
                name: project.name.clone(),
                url: project.url.clone(),
                has_description,
            }),
            initiative,
            issues: IssueCountCheck {
                expected: expected_issue_count,
                found: issues.len(),
            },
            labels,
            overall: Overall::from_gaps(gaps),
        })
    }

    async fn check_issue_labels(
        &self,
        title: &str,
        wanted: &[String],
        unmatched: &mut Vec<&Issue>,
    ) -> TrackerResult<IssueLabelCheck> {
        let position = unmatched
            .iter()
            .position(|i| i.title.trim().eq_ignore_ascii_case(title.trim()));
        let Some(issue) = position.map(|index| unmatched.remove(index)) else {
            return Ok(IssueLabelCheck {
                title: title.to_string(),
                identifier: None,
                missing: wanted.to_vec(),
            });
        };

        let actual: Vec<String> = self
            .tracker
            .issue_labels(&issue.id)
            .await?
            .into_iter()
            .map(|l| l.name.trim().to_lowercase())
            .collect();
        let missing = wanted
            .iter()
            .filter(|w| !actual.contains(&w.trim().to_lowercase()))
            .cloned()
            .collect();

        Ok(IssueLabelCheck {
            title: title.to_string(),
            identifier: Some(issue.identifier.clone()),
            missing,
        })
    }
}

/// Exact match ignoring case first, then the first candidate containing `name`.
fn fuzzy_match(name: &str, candidates: Vec<Project>) -> Option<Project> {
    let wanted = name.trim().to_lowercase();
    let mut contains = None;
    for project in candidates {
        let candidate = project.name.trim().to_lowercase();
        if candidate == wanted {
            return Some(project);
        }
        if contains.is_none() && candidate.contains(&wanted) {
            contains = Some(project);
        }
    }
    contains
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Initiative, Label};
    use crate::tracker::MockTracker;

    fn project(id: &str, name: &str) -> Project {
        Project {
            id: id.to_string(),
            name: name.to_string(),
            description: Some("Harden login".to_string()),
            content: None,
            url: None,
            state: None,
        }
    }

    fn issue(id: &str, title: &str) -> Issue {
        Issue {
            id: id.to_string(),
            identifier: format!("ENG-{id}"),
            title: title.to_string(),
            url: None,
            labels: Vec::new(),
        }
    }

    #[test]
    fn test_fuzzy_match_prefers_exact() {
        let found = fuzzy_match(
            "auth",
            vec![project("1", "Auth Hardening"), project("2", "AUTH")],
        )
        .unwrap();
        assert_eq!(found.id, "2");

        let found = fuzzy_match("auth", vec![project("1", "Auth Hardening")]).unwrap();
        assert_eq!(found.id, "1");

        assert!(fuzzy_match("billing", vec![project("1", "Auth Hardening")]).is_none());
    }

    #[tokio::test]
    async fn test_missing_project_is_a_gap_not_an_error() {
        let mut tracker = MockTracker::new();
        tracker.expect_search_projects().returning(|_| Ok(vec![]));

        let report = Verifier::new(&tracker)
            .verify_project_creation("Ghost", 3, None, None)
            .await
            .unwrap();
        assert!(!report.overall.passed);
        assert_eq!(report.overall.gaps, vec!["Project 'Ghost' not found"]);
    }

    #[tokio::test]
    async fn test_reports_every_gap() {
        let mut tracker = MockTracker::new();
        tracker.expect_search_projects().returning(|_| {
            let mut p = project("p1", "Auth");
            p.description = None;
            Ok(vec![p])
        });
        tracker.expect_project_initiatives().returning(|_| {
            Ok(vec![Initiative {
                id: "other".to_string(),
                name: "Other".to_string(),
            }])
        });
        tracker
            .expect_project_issues()
            .returning(|_| Ok(vec![issue("1", "Rotate keys")]));
        tracker.expect_issue_labels().returning(|_| {
            Ok(vec![Label {
                id: "l".to_string(),
                name: "Security".to_string(),
                color: None,
            }])
        });

        let expected: ExpectedLabels = vec![
            ("Audit log".to_string(), vec!["security".to_string()]),
            (
                "Rotate keys".to_string(),
                vec!["security".to_string(), "bug".to_string()],
            ),
        ];

        let report = Verifier::new(&tracker)
            .verify_project_creation("auth", 2, Some(&expected), Some("init-1"))
            .await
            .unwrap();

        assert!(!report.overall.passed);
        assert_eq!(
            report.overall.gaps,
            vec![
                "Project 'Auth' has no description",
                "Project not linked to initiative init-1",
                "Expected at least 2 issues, found 1",
                "Issue 'Audit log' not found",
                "Issue ENG-1 'Rotate keys' missing labels: bug",
            ]
        );
    }

    #[tokio::test]
    async fn test_repeated_titles_need_distinct_issues() {
        let mut tracker = MockTracker::new();
        tracker
            .expect_search_projects()
            .returning(|_| Ok(vec![project("p1", "Docs")]));
        tracker
            .expect_project_issues()
            .returning(|_| Ok(vec![issue("1", "Write guide")]));
        tracker.expect_issue_labels().times(1).returning(|_| {
            Ok(vec![Label {
                id: "l".to_string(),
                name: "documentation".to_string(),
                color: None,
            }])
        });

        let expected: ExpectedLabels = vec![
            ("Write guide".to_string(), vec!["documentation".to_string()]),
            ("Write guide".to_string(), vec!["documentation".to_string()]),
        ];
        let report = Verifier::new(&tracker)
            .verify_project_creation("Docs", 0, Some(&expected), None)
            .await
            .unwrap();

        assert_eq!(report.overall.gaps, vec!["Issue 'Write guide' not found"]);
        assert_eq!(report.labels[0].identifier.as_deref(), Some("ENG-1"));
        assert!(report.labels[1].identifier.is_none());
    }

    #[tokio::test]
    async fn test_remote_failure_is_an_error() {
        let mut tracker = MockTracker::new();
        tracker
            .expect_search_projects()
            .returning(|_| Err(TrackerError::Transient("HTTP 502".to_string())));

        let err = Verifier::new(&tracker)
            .verify_project_creation("Auth", 0, None, None)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_verify_initiative_filters_projects() {
        let mut tracker = MockTracker::new();
        tracker.expect_initiative_projects().returning(|_| {
            Ok(vec![project("p1", "Auth Hardening"), project("p2", "Billing")])
        });
        tracker.expect_project_initiatives().returning(|_| {
            Ok(vec![Initiative {
                id: "init-1".to_string(),
                name: "Security".to_string(),
            }])
        });
        tracker
            .expect_project_issues()
            .returning(|_| Ok(vec![issue("1", "Rotate keys")]));

        let report = Verifier::new(&tracker)
            .verify_initiative("init-1", Some("auth"), 1)
            .await
            .unwrap();
        assert_eq!(report.projects.len(), 1);
        assert!(report.overall.passed);

        let report = Verifier::new(&tracker)
            .verify_initiative("init-1", Some("mobile"), 1)
            .await
            .unwrap();
        assert!(!report.overall.passed);
        assert_eq!(
            report.overall.gaps,
            vec!["No projects matching 'mobile' linked to initiative init-1"]
        );
    }
}
