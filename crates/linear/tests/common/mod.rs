//! In-memory tracker shared by the integration tests.
//!
//! Behaves like the remote API where it matters: label names are unique per
//! team ignoring case, initiative links are unique, and issue label updates
//! replace the whole set.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use linear::models::{
    Initiative, Issue, IssueCreateInput, Label, LabelCreateInput, Project, ProjectCreateInput,
    ProjectUpdateInput, Team, WorkflowState,
};
use linear::{Tracker, TrackerError, TrackerResult};

pub const TEAM_ID: &str = "team-eng";
pub const INITIATIVE_ID: &str = "init-security";

#[derive(Default)]
struct State {
    next_id: usize,
    teams: HashMap<String, Team>,
    states: Vec<WorkflowState>,
    labels: HashMap<String, Vec<Label>>,
    projects: Vec<Project>,
    initiatives: HashMap<String, Initiative>,
    links: HashSet<(String, String)>,
    issues: Vec<(Option<String>, Issue)>,
    issue_labels: HashMap<String, Vec<String>>,
    /// Workflow state each issue was created in
    issue_states: HashMap<String, Option<String>>,
    /// Names another process creates right before our create call lands
    races: HashSet<String>,
    /// Names whose creation fails outright
    failing_labels: HashSet<String>,
    calls: HashMap<&'static str, usize>,
}

impl State {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn count(&mut self, method: &'static str) {
        *self.calls.entry(method).or_default() += 1;
    }

    fn team_labels(&mut self, team_id: &str) -> &mut Vec<Label> {
        self.labels.entry(team_id.to_string()).or_default()
    }

    fn label_by_id(&self, id: &str) -> Option<Label> {
        self.labels.values().flatten().find(|l| l.id == id).cloned()
    }

    fn labels_of(&self, issue_id: &str) -> Vec<Label> {
        self.issue_labels
            .get(issue_id)
            .map(|ids| ids.iter().filter_map(|id| self.label_by_id(id)).collect())
            .unwrap_or_default()
    }
}

/// Stateful fake of the remote tracker.
pub struct FakeTracker {
    state: Mutex<State>,
}

impl Default for FakeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTracker {
    /// One team with the usual workflow states and one initiative.
    pub fn new() -> Self {
        let mut state = State::default();
        state.teams.insert(
            TEAM_ID.to_string(),
            Team {
                id: TEAM_ID.to_string(),
                name: "Engineering".to_string(),
                key: "ENG".to_string(),
            },
        );
        state.states = ["Backlog", "Todo", "In Progress", "Done"]
            .iter()
            .enumerate()
            .map(|(i, name)| WorkflowState {
                id: format!("state-{i}"),
                name: (*name).to_string(),
                state_type: "unstarted".to_string(),
                position: f64::from(u32::try_from(i).unwrap()),
            })
            .collect();
        state.initiatives.insert(
            INITIATIVE_ID.to_string(),
            Initiative {
                id: INITIATIVE_ID.to_string(),
                name: "Security".to_string(),
            },
        );
        Self {
            state: Mutex::new(state),
        }
    }

    /// Seed a label as if it already existed remotely.
    pub fn with_label(self, name: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let id = state.id("label");
            state.team_labels(TEAM_ID).push(Label {
                id,
                name: name.to_string(),
                color: None,
            });
        }
        self
    }

    /// Make another writer win the race for `name`.
    pub fn race_on(&self, name: &str) {
        self.state.lock().unwrap().races.insert(name.to_lowercase());
    }

    /// Make creation of `name` fail with a non-duplicate error.
    pub fn fail_on(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_labels
            .insert(name.to_lowercase());
    }

    pub fn labels(&self) -> Vec<Label> {
        self.state
            .lock()
            .unwrap()
            .labels
            .get(TEAM_ID)
            .cloned()
            .unwrap_or_default()
    }

    pub fn projects(&self) -> Vec<Project> {
        self.state.lock().unwrap().projects.clone()
    }

    pub fn issue_count(&self) -> usize {
        self.state.lock().unwrap().issues.len()
    }

    /// Label names currently attached to an issue.
    pub fn issue_label_names(&self, issue_id: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .labels_of(issue_id)
            .into_iter()
            .map(|l| l.name)
            .collect()
    }

    /// Workflow state id an issue was created with, `None` for the team default.
    pub fn issue_state(&self, issue_id: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .issue_states
            .get(issue_id)
            .cloned()
            .flatten()
    }

    /// Number of times a tracker method was called.
    pub fn calls(&self, method: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(method)
            .copied()
            .unwrap_or_default()
    }

    /// Attach a label directly, bypassing the library.
    pub fn attach(&self, issue_id: &str, label_id: &str) {
        self.state
            .lock()
            .unwrap()
            .issue_labels
            .entry(issue_id.to_string())
            .or_default()
            .push(label_id.to_string());
    }
}

#[async_trait]
impl Tracker for FakeTracker {
    async fn find_team(&self, team_id: &str) -> TrackerResult<Team> {
        let mut state = self.state.lock().unwrap();
        state.count("find_team");
        state
            .teams
            .get(team_id)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(format!("team {team_id}")))
    }

    async fn workflow_states(&self, team_id: &str) -> TrackerResult<Vec<WorkflowState>> {
        let mut state = self.state.lock().unwrap();
        state.count("workflow_states");
        if !state.teams.contains_key(team_id) {
            return Err(TrackerError::NotFound(format!("team {team_id}")));
        }
        Ok(state.states.clone())
    }

    async fn list_labels(&self, team_id: &str) -> TrackerResult<Vec<Label>> {
        let mut state = self.state.lock().unwrap();
        state.count("list_labels");
        if !state.teams.contains_key(team_id) {
            return Err(TrackerError::NotFound(format!("team {team_id}")));
        }
        Ok(state.team_labels(team_id).clone())
    }

    async fn create_label(&self, input: LabelCreateInput) -> TrackerResult<Label> {
        let mut state = self.state.lock().unwrap();
        state.count("create_label");
        let key = input.name.to_lowercase();

        if state.failing_labels.contains(&key) {
            return Err(TrackerError::Transient("HTTP 503".to_string()));
        }
        if state.races.remove(&key) {
            let id = state.id("label-race");
            state.team_labels(&input.team_id).push(Label {
                id,
                name: input.name.clone(),
                color: Some(input.color.clone()),
            });
        }
        if state
            .team_labels(&input.team_id)
            .iter()
            .any(|l| l.name.to_lowercase() == key)
        {
            return Err(TrackerError::Duplicate("Duplicate label name".to_string()));
        }

        let label = Label {
            id: state.id("label"),
            name: input.name,
            color: Some(input.color),
        };
        state.team_labels(&input.team_id).push(label.clone());
        Ok(label)
    }

    async fn search_projects(&self, name: &str) -> TrackerResult<Vec<Project>> {
        let mut state = self.state.lock().unwrap();
        state.count("search_projects");
        let needle = name.to_lowercase();
        Ok(state
            .projects
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn create_project(&self, input: ProjectCreateInput) -> TrackerResult<Project> {
        let mut state = self.state.lock().unwrap();
        state.count("create_project");
        let id = state.id("project");
        let project = Project {
            url: Some(format!("https://linear.app/eng/project/{id}")),
            id,
            name: input.name,
            description: input.description,
            content: None,
            state: input.state,
        };
        state.projects.push(project.clone());
        Ok(project)
    }

    async fn update_project(
        &self,
        project_id: &str,
        input: ProjectUpdateInput,
    ) -> TrackerResult<Project> {
        let mut state = self.state.lock().unwrap();
        state.count("update_project");
        let project = state
            .projects
            .iter_mut()
            .find(|p| p.id == project_id)
            .ok_or_else(|| TrackerError::NotFound(format!("project {project_id}")))?;
        if input.description.is_some() {
            project.description = input.description;
        }
        if input.content.is_some() {
            project.content = input.content;
        }
        if input.state.is_some() {
            project.state = input.state;
        }
        Ok(project.clone())
    }

    async fn link_project_to_initiative(
        &self,
        project_id: &str,
        initiative_id: &str,
    ) -> TrackerResult<()> {
        let mut state = self.state.lock().unwrap();
        state.count("link_project_to_initiative");
        if !state.initiatives.contains_key(initiative_id) {
            return Err(TrackerError::NotFound(format!("initiative {initiative_id}")));
        }
        if !state
            .links
            .insert((project_id.to_string(), initiative_id.to_string()))
        {
            return Err(TrackerError::Duplicate(
                "Project is already linked to this initiative".to_string(),
            ));
        }
        Ok(())
    }

    async fn project_initiatives(&self, project_id: &str) -> TrackerResult<Vec<Initiative>> {
        let mut state = self.state.lock().unwrap();
        state.count("project_initiatives");
        Ok(state
            .links
            .iter()
            .filter(|(p, _)| p == project_id)
            .filter_map(|(_, i)| state.initiatives.get(i).cloned())
            .collect())
    }

    async fn initiative_projects(&self, initiative_id: &str) -> TrackerResult<Vec<Project>> {
        let mut state = self.state.lock().unwrap();
        state.count("initiative_projects");
        Ok(state
            .projects
            .iter()
            .filter(|p| state.links.contains(&(p.id.clone(), initiative_id.to_string())))
            .cloned()
            .collect())
    }

    async fn project_issues(&self, project_id: &str) -> TrackerResult<Vec<Issue>> {
        let mut state = self.state.lock().unwrap();
        state.count("project_issues");
        Ok(state
            .issues
            .iter()
            .filter(|(p, _)| p.as_deref() == Some(project_id))
            .map(|(_, issue)| Issue {
                labels: state.labels_of(&issue.id),
                ..issue.clone()
            })
            .collect())
    }

    async fn create_issue(&self, input: IssueCreateInput) -> TrackerResult<Issue> {
        let mut state = self.state.lock().unwrap();
        state.count("create_issue");
        if input.title.contains("[reject]") {
            return Err(TrackerError::Other("Argument Validation Error".to_string()));
        }
        let id = state.id("issue");
        let issue = Issue {
            identifier: format!("ENG-{}", state.issues.len() + 1),
            id: id.clone(),
            title: input.title,
            url: None,
            labels: Vec::new(),
        };
        state.issue_states.insert(id.clone(), input.state_id);
        state.issue_labels.insert(id, input.label_ids);
        state.issues.push((input.project_id, issue.clone()));
        Ok(Issue {
            labels: state.labels_of(&issue.id),
            ..issue
        })
    }

    async fn issue_labels(&self, issue_id: &str) -> TrackerResult<Vec<Label>> {
        let mut state = self.state.lock().unwrap();
        state.count("issue_labels");
        if !state.issues.iter().any(|(_, i)| i.id == issue_id) {
            return Err(TrackerError::NotFound(format!("issue {issue_id}")));
        }
        Ok(state.labels_of(issue_id))
    }

    async fn set_issue_labels(&self, issue_id: &str, label_ids: Vec<String>) -> TrackerResult<()> {
        let mut state = self.state.lock().unwrap();
        state.count("set_issue_labels");
        if !state.issues.iter().any(|(_, i)| i.id == issue_id) {
            return Err(TrackerError::NotFound(format!("issue {issue_id}")));
        }
        state.issue_labels.insert(issue_id.to_string(), label_ids);
        Ok(())
    }
}

/// Create a bare issue outside any project, for label tests.
pub async fn seed_issue(tracker: &FakeTracker, title: &str) -> Issue {
    tracker
        .create_issue(IssueCreateInput {
            team_id: TEAM_ID.to_string(),
            title: title.to_string(),
            description: None,
            priority: None,
            estimate: None,
            label_ids: Vec::new(),
            project_id: None,
            state_id: None,
        })
        .await
        .unwrap()
}
