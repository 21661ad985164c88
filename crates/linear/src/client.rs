//! GraphQL client for Linear API.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{TrackerError, TrackerResult};
use crate::models::{
    Initiative, Issue, IssueCreateInput, Label, LabelCreateInput, Project, ProjectCreateInput,
    ProjectUpdateInput, Team, WorkflowState,
};
use crate::tracker::Tracker;

/// Linear API endpoint
pub const LINEAR_API_URL: &str = "https://api.linear.app/graphql";

/// Page size for list queries
const PAGE_SIZE: i32 = 250;

/// Linear GraphQL client
#[derive(Debug, Clone)]
pub struct LinearClient {
    client: reqwest::Client,
    api_url: String,
}

/// GraphQL request body
#[derive(Debug, Serialize)]
struct GraphQLRequest<V: Serialize> {
    query: &'static str,
    variables: V,
}

/// GraphQL response wrapper
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

/// GraphQL error
#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
    #[serde(default)]
    extensions: Option<GraphQLErrorExtensions>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphQLErrorExtensions {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    user_presentable_message: Option<String>,
}

/// Relay-style connection
#[derive(Debug, Deserialize)]
struct Connection<T> {
    nodes: Vec<T>,
    #[serde(rename = "pageInfo", default)]
    page_info: Option<PageInfo>,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    #[serde(rename = "hasNextPage")]
    has_next_page: bool,
    #[serde(rename = "endCursor")]
    end_cursor: Option<String>,
}

impl<T> Connection<T> {
    /// Cursor for the following page, if the server reported one.
    fn next_cursor(&self) -> Option<String> {
        self.page_info
            .as_ref()
            .filter(|info| info.has_next_page)
            .and_then(|info| info.end_cursor.clone())
    }
}

/// Mutation payload carrying only a success flag
#[derive(Debug, Deserialize)]
struct SuccessPayload {
    success: bool,
}

/// Issue as returned by queries that nest labels in a connection
#[derive(Debug, Deserialize)]
struct IssueNode {
    id: String,
    identifier: String,
    title: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    labels: Option<Connection<Label>>,
}

impl From<IssueNode> for Issue {
    fn from(node: IssueNode) -> Self {
        Self {
            id: node.id,
            identifier: node.identifier,
            title: node.title,
            url: node.url,
            labels: node.labels.map(|c| c.nodes).unwrap_or_default(),
        }
    }
}

impl LinearClient {
    /// Create a new Linear client with access token.
    ///
    /// # Arguments
    /// * `access_token` - OAuth access token or Personal API key
    ///   - OAuth tokens: Use "Bearer" prefix (handled automatically)
    ///   - API keys (`lin_api_*`): Use token directly without prefix
    ///
    /// # Errors
    /// Returns error if headers cannot be constructed
    pub fn new(access_token: &str) -> TrackerResult<Self> {
        Self::with_url(access_token, LINEAR_API_URL)
    }

    /// Create a client against a custom API URL (proxies, tests).
    ///
    /// # Errors
    /// Returns error if headers cannot be constructed
    pub fn with_url(access_token: &str, api_url: &str) -> TrackerResult<Self> {
        let mut headers = HeaderMap::new();

        // Linear API keys (lin_api_*) must not use the Bearer prefix
        let auth_value = if access_token.starts_with("lin_api_") {
            access_token.to_string()
        } else {
            format!("Bearer {access_token}")
        };

        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| TrackerError::Other(format!("Invalid access token: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| TrackerError::Other(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
        })
    }

    /// Endpoint this client talks to.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Execute a GraphQL query/mutation
    async fn execute<V: Serialize, R: DeserializeOwned>(
        &self,
        query: &'static str,
        variables: V,
    ) -> TrackerResult<R> {
        let request = GraphQLRequest { query, variables };

        let response = self.client.post(&self.api_url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Linear reports GraphQL errors with 400; prefer their classification
            if let Ok(gql) = serde_json::from_str::<GraphQLResponse<serde_json::Value>>(&body) {
                if let Some(err) = first_error(gql.errors) {
                    return Err(err);
                }
            }
            return Err(TrackerError::from_status(status.as_u16(), &body));
        }

        let gql_response: GraphQLResponse<R> = response
            .json()
            .await
            .map_err(|e| TrackerError::Other(format!("Failed to parse Linear API response: {e}")))?;

        if let Some(err) = first_error(gql_response.errors) {
            return Err(err);
        }

        gql_response
            .data
            .ok_or_else(|| TrackerError::Other("No data in GraphQL response".to_string()))
    }
}

/// Classify the first GraphQL error, folding the rest into its message.
fn first_error(errors: Option<Vec<GraphQLError>>) -> Option<TrackerError> {
    let errors = errors.filter(|e| !e.is_empty())?;
    let messages: Vec<String> = errors
        .iter()
        .map(|e| {
            e.extensions
                .as_ref()
                .and_then(|x| x.user_presentable_message.clone())
                .map_or_else(|| e.message.clone(), |m| format!("{}: {m}", e.message))
        })
        .collect();
    let code = errors[0]
        .extensions
        .as_ref()
        .and_then(|x| x.code.as_deref());
    Some(TrackerError::classify(&messages.join(", "), code))
}

fn require<T>(success: bool, entity: Option<T>, what: &str) -> TrackerResult<T> {
    if !success {
        return Err(TrackerError::Other(format!("Failed to {what}")));
    }
    entity.ok_or_else(|| TrackerError::Other(format!("Nothing returned after {what}")))
}

#[derive(Serialize)]
struct IdVariables<'a> {
    id: &'a str,
}

#[async_trait]
impl Tracker for LinearClient {
    // =========================================================================
    // Team Operations
    // =========================================================================

    #[instrument(skip(self), fields(team_id = %team_id))]
    async fn find_team(&self, team_id: &str) -> TrackerResult<Team> {
        #[derive(Deserialize)]
        struct Response {
            team: Option<Team>,
        }

        const QUERY: &str = r"
            query GetTeam($id: String!) {
                team(id: $id) {
                    id
                    name
                    key
                }
            }
        ";

        let response: Response = self.execute(QUERY, IdVariables { id: team_id }).await?;
        response
            .team
            .ok_or_else(|| TrackerError::NotFound(format!("team {team_id}")))
    }

    #[instrument(skip(self), fields(team_id = %team_id))]
    async fn workflow_states(&self, team_id: &str) -> TrackerResult<Vec<WorkflowState>> {
        #[derive(Serialize)]
        struct Variables<'a> {
            #[serde(rename = "teamId")]
            team_id: &'a str,
        }

        #[derive(Deserialize)]
        struct Response {
            #[serde(rename = "workflowStates")]
            workflow_states: Connection<WorkflowState>,
        }

        const QUERY: &str = r"
            query GetTeamWorkflowStates($teamId: ID!) {
                workflowStates(filter: { team: { id: { eq: $teamId } } }) {
                    nodes {
                        id
                        name
                        type
                        position
                    }
                }
            }
        ";

        let response: Response = self.execute(QUERY, Variables { team_id }).await?;
        Ok(response.workflow_states.nodes)
    }

    // =========================================================================
    // Label Operations
    // =========================================================================

    #[instrument(skip(self), fields(team_id = %team_id))]
    async fn list_labels(&self, team_id: &str) -> TrackerResult<Vec<Label>> {
        #[derive(Serialize)]
        struct Variables<'a> {
            #[serde(rename = "teamId")]
            team_id: &'a str,
            first: i32,
            #[serde(skip_serializing_if = "Option::is_none")]
            after: Option<String>,
        }

        #[derive(Deserialize)]
        struct Response {
            #[serde(rename = "issueLabels")]
            issue_labels: Connection<Label>,
        }

        const QUERY: &str = r"
            query ListTeamLabels($teamId: ID!, $first: Int!, $after: String) {
                issueLabels(first: $first, after: $after, filter: { team: { id: { eq: $teamId } } }) {
                    nodes {
                        id
                        name
                        color
                    }
                    pageInfo {
                        hasNextPage
                        endCursor
                    }
                }
            }
        ";

        let mut labels = Vec::new();
        let mut after = None;
        loop {
            let response: Response = self
                .execute(
                    QUERY,
                    Variables {
                        team_id,
                        first: PAGE_SIZE,
                        after,
                    },
                )
                .await?;
            after = response.issue_labels.next_cursor();
            labels.extend(response.issue_labels.nodes);
            if after.is_none() {
                break;
            }
        }
        debug!(count = labels.len(), "Fetched team labels");
        Ok(labels)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn create_label(&self, input: LabelCreateInput) -> TrackerResult<Label> {
        #[derive(Serialize)]
        struct Variables {
            input: LabelCreateInput,
        }

        #[derive(Deserialize)]
        struct Response {
            #[serde(rename = "issueLabelCreate")]
            issue_label_create: LabelCreateResult,
        }

        #[derive(Deserialize)]
        struct LabelCreateResult {
            success: bool,
            #[serde(rename = "issueLabel")]
            issue_label: Option<Label>,
        }

        const MUTATION: &str = r"
            mutation CreateLabel($input: IssueLabelCreateInput!) {
                issueLabelCreate(input: $input) {
                    success
                    issueLabel {
                        id
                        name
                        color
                    }
                }
            }
        ";

        let response: Response = self.execute(MUTATION, Variables { input }).await?;
        let result = response.issue_label_create;
        require(result.success, result.issue_label, "create label")
    }

    // =========================================================================
    // Project Operations
    // =========================================================================

    #[instrument(skip(self), fields(name = %name))]
    async fn search_projects(&self, name: &str) -> TrackerResult<Vec<Project>> {
        #[derive(Serialize)]
        struct Variables<'a> {
            name: &'a str,
            first: i32,
        }

        #[derive(Deserialize)]
        struct Response {
            projects: Connection<Project>,
        }

        const QUERY: &str = r"
            query SearchProjects($name: String!, $first: Int!) {
                projects(first: $first, filter: { name: { containsIgnoreCase: $name } }) {
                    nodes {
                        id
                        name
                        description
                        content
                        url
                        state
                    }
                }
            }
        ";

        let response: Response = self
            .execute(
                QUERY,
                Variables {
                    name,
                    first: PAGE_SIZE,
                },
            )
            .await?;
        Ok(response.projects.nodes)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn create_project(&self, input: ProjectCreateInput) -> TrackerResult<Project> {
        #[derive(Serialize)]
        struct Variables {
            input: ProjectCreateInput,
        }

        #[derive(Deserialize)]
        struct Response {
            #[serde(rename = "projectCreate")]
            project_create: ProjectPayload,
        }

        const MUTATION: &str = r"
            mutation CreateProject($input: ProjectCreateInput!) {
                projectCreate(input: $input) {
                    success
                    project {
                        id
                        name
                        description
                        content
                        url
                        state
                    }
                }
            }
        ";

        let response: Response = self.execute(MUTATION, Variables { input }).await?;
        let result = response.project_create;
        require(result.success, result.project, "create project")
    }

    #[instrument(skip(self, input), fields(project_id = %project_id))]
    async fn update_project(
        &self,
        project_id: &str,
        input: ProjectUpdateInput,
    ) -> TrackerResult<Project> {
        #[derive(Serialize)]
        struct Variables<'a> {
            id: &'a str,
            input: ProjectUpdateInput,
        }

        #[derive(Deserialize)]
        struct Response {
            #[serde(rename = "projectUpdate")]
            project_update: ProjectPayload,
        }

        const MUTATION: &str = r"
            mutation UpdateProject($id: String!, $input: ProjectUpdateInput!) {
                projectUpdate(id: $id, input: $input) {
                    success
                    project {
                        id
                        name
                        description
                        content
                        url
                        state
                    }
                }
            }
        ";

        let response: Response = self
            .execute(
                MUTATION,
                Variables {
                    id: project_id,
                    input,
                },
            )
            .await?;
        let result = response.project_update;
        require(result.success, result.project, "update project")
    }

    #[instrument(skip(self), fields(project_id = %project_id, initiative_id = %initiative_id))]
    async fn link_project_to_initiative(
        &self,
        project_id: &str,
        initiative_id: &str,
    ) -> TrackerResult<()> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Input<'a> {
            project_id: &'a str,
            initiative_id: &'a str,
        }

        #[derive(Serialize)]
        struct Variables<'a> {
            input: Input<'a>,
        }

        #[derive(Deserialize)]
        struct Response {
            #[serde(rename = "initiativeToProjectCreate")]
            initiative_to_project_create: SuccessPayload,
        }

        const MUTATION: &str = r"
            mutation LinkProjectToInitiative($input: InitiativeToProjectCreateInput!) {
                initiativeToProjectCreate(input: $input) {
                    success
                }
            }
        ";

        let response: Response = self
            .execute(
                MUTATION,
                Variables {
                    input: Input {
                        project_id,
                        initiative_id,
                    },
                },
            )
            .await?;

        if !response.initiative_to_project_create.success {
            return Err(TrackerError::Other(
                "Failed to link project to initiative".to_string(),
            ));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(project_id = %project_id))]
    async fn project_initiatives(&self, project_id: &str) -> TrackerResult<Vec<Initiative>> {
        #[derive(Deserialize)]
        struct Response {
            project: Option<ProjectInitiatives>,
        }

        #[derive(Deserialize)]
        struct ProjectInitiatives {
            initiatives: Connection<Initiative>,
        }

        const QUERY: &str = r"
            query GetProjectInitiatives($id: String!) {
                project(id: $id) {
                    initiatives {
                        nodes {
                            id
                            name
                        }
                    }
                }
            }
        ";

        let response: Response = self.execute(QUERY, IdVariables { id: project_id }).await?;
        response
            .project
            .map(|p| p.initiatives.nodes)
            .ok_or_else(|| TrackerError::NotFound(format!("project {project_id}")))
    }

    #[instrument(skip(self), fields(initiative_id = %initiative_id))]
    async fn initiative_projects(&self, initiative_id: &str) -> TrackerResult<Vec<Project>> {
        #[derive(Deserialize)]
        struct Response {
            initiative: Option<InitiativeProjects>,
        }

        #[derive(Deserialize)]
        struct InitiativeProjects {
            projects: Connection<Project>,
        }

        const QUERY: &str = r"
            query GetInitiativeProjects($id: String!) {
                initiative(id: $id) {
                    projects {
                        nodes {
                            id
                            name
                            description
                            content
                            url
                            state
                        }
                    }
                }
            }
        ";

        let response: Response = self
            .execute(QUERY, IdVariables { id: initiative_id })
            .await?;
        response
            .initiative
            .map(|i| i.projects.nodes)
            .ok_or_else(|| TrackerError::NotFound(format!("initiative {initiative_id}")))
    }

    // =========================================================================
    // Issue Operations
    // =========================================================================

    #[instrument(skip(self), fields(project_id = %project_id))]
    async fn project_issues(&self, project_id: &str) -> TrackerResult<Vec<Issue>> {
        #[derive(Serialize)]
        struct Variables<'a> {
            id: &'a str,
            first: i32,
        }

        #[derive(Deserialize)]
        struct Response {
            project: Option<ProjectIssues>,
        }

        #[derive(Deserialize)]
        struct ProjectIssues {
            issues: Connection<IssueNode>,
        }

        const QUERY: &str = r"
            query GetProjectIssues($id: String!, $first: Int!) {
                project(id: $id) {
                    issues(first: $first) {
                        nodes {
                            id
                            identifier
                            title
                            url
                            labels {
                                nodes {
                                    id
                                    name
                                    color
                                }
                            }
                        }
                    }
                }
            }
        ";

        let response: Response = self
            .execute(
                QUERY,
                Variables {
                    id: project_id,
                    first: PAGE_SIZE,
                },
            )
            .await?;
        response
            .project
            .map(|p| p.issues.nodes.into_iter().map(Issue::from).collect())
            .ok_or_else(|| TrackerError::NotFound(format!("project {project_id}")))
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    async fn create_issue(&self, input: IssueCreateInput) -> TrackerResult<Issue> {
        #[derive(Serialize)]
        struct Variables {
            input: IssueCreateInput,
        }

        #[derive(Deserialize)]
        struct Response {
            #[serde(rename = "issueCreate")]
            issue_create: IssueCreateResult,
        }

        #[derive(Deserialize)]
        struct IssueCreateResult {
            success: bool,
            issue: Option<IssueNode>,
        }

        const MUTATION: &str = r"
            mutation CreateIssue($input: IssueCreateInput!) {
                issueCreate(input: $input) {
                    success
                    issue {
                        id
                        identifier
                        title
                        url
                        labels {
                            nodes {
                                id
                                name
                                color
                            }
                        }
                    }
                }
            }
        ";

        let response: Response = self.execute(MUTATION, Variables { input }).await?;
        let result = response.issue_create;
        require(result.success, result.issue, "create issue").map(Issue::from)
    }

    #[instrument(skip(self), fields(issue_id = %issue_id))]
    async fn issue_labels(&self, issue_id: &str) -> TrackerResult<Vec<Label>> {
        #[derive(Deserialize)]
        struct Response {
            issue: Option<IssueLabels>,
        }

        #[derive(Deserialize)]
        struct IssueLabels {
            labels: Connection<Label>,
        }

        const QUERY: &str = r"
            query GetIssueLabels($id: String!) {
                issue(id: $id) {
                    labels {
                        nodes {
                            id
                            name
                            color
                        }
                    }
                }
            }
        ";

        let response: Response = self.execute(QUERY, IdVariables { id: issue_id }).await?;
        response
            .issue
            .map(|i| i.labels.nodes)
            .ok_or_else(|| TrackerError::NotFound(format!("issue {issue_id}")))
    }

    #[instrument(skip(self, label_ids), fields(issue_id = %issue_id, count = label_ids.len()))]
    async fn set_issue_labels(&self, issue_id: &str, label_ids: Vec<String>) -> TrackerResult<()> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Input {
            label_ids: Vec<String>,
        }

        #[derive(Serialize)]
        struct Variables<'a> {
            id: &'a str,
            input: Input,
        }

        #[derive(Deserialize)]
        struct Response {
            #[serde(rename = "issueUpdate")]
            issue_update: SuccessPayload,
        }

        const MUTATION: &str = r"
            mutation SetIssueLabels($id: String!, $input: IssueUpdateInput!) {
                issueUpdate(id: $id, input: $input) {
                    success
                }
            }
        ";

        let response: Response = self
            .execute(
                MUTATION,
                Variables {
                    id: issue_id,
                    input: Input { label_ids },
                },
            )
            .await?;

        if !response.issue_update.success {
            return Err(TrackerError::Other("Failed to update issue labels".to_string()));
        }
        Ok(())
    }
}

/// Payload shared by project create/update mutations
#[derive(Debug, Deserialize)]
struct ProjectPayload {
    success: bool,
    project: Option<Project>,
}
