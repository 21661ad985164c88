//! Call-scoped lookup caches.
//!
//! A [`LookupCache`] lives for exactly one top-level operation (one
//! `create_project`, one CLI command) and is passed explicitly. It is never
//! stored globally and must be invalidated after mutations that could change
//! what it holds.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use crate::error::TrackerResult;
use crate::models::{Label, Team, WorkflowState};
use crate::tracker::Tracker;

/// Case-insensitive label name to ID map for one team.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
    entries: HashMap<String, Label>,
}

impl LabelMap {
    /// Build from a remote label list. On case-insensitive collisions the
    /// first label wins.
    #[must_use]
    pub fn from_labels(labels: impl IntoIterator<Item = Label>) -> Self {
        let mut map = Self::default();
        for label in labels {
            map.entries.entry(key(&label.name)).or_insert(label);
        }
        map
    }

    /// Remote ID for a label name, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn id(&self, name: &str) -> Option<&str> {
        self.entries.get(&key(name)).map(|l| l.id.as_str())
    }

    /// Remote label for a name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Label> {
        self.entries.get(&key(name))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&key(name))
    }

    /// Record a label; an existing entry with the same name is replaced.
    pub fn insert(&mut self, label: Label) {
        self.entries.insert(key(&label.name), label);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Labels sorted by name, for stable output.
    #[must_use]
    pub fn labels(&self) -> Vec<&Label> {
        let mut labels: Vec<&Label> = self.entries.values().collect();
        labels.sort_by(|a, b| a.name.cmp(&b.name));
        labels
    }
}

/// Serialized as a name to ID object, sorted by name.
impl Serialize for LabelMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let labels = self.labels();
        let mut map = serializer.serialize_map(Some(labels.len()))?;
        for label in labels {
            map.serialize_entry(&label.name, &label.id)?;
        }
        map.end()
    }
}

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Team and workflow-state lookups for one top-level invocation.
#[derive(Debug, Default)]
pub struct LookupCache {
    teams: HashMap<String, Team>,
    states: HashMap<String, Vec<WorkflowState>>,
}

impl LookupCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a team, fetching it on first use.
    ///
    /// # Errors
    /// Propagates the tracker error; a missing team is `NotFound`.
    pub async fn team<T: Tracker + ?Sized>(
        &mut self,
        tracker: &T,
        team_id: &str,
    ) -> TrackerResult<Team> {
        if let Some(team) = self.teams.get(team_id) {
            debug!(team_id, "Team cache hit");
            return Ok(team.clone());
        }
        let team = tracker.find_team(team_id).await?;
        self.teams.insert(team_id.to_string(), team.clone());
        Ok(team)
    }

    /// Resolve a workflow state ID by name (case-insensitive).
    ///
    /// # Errors
    /// Propagates the tracker error from the first fetch.
    pub async fn state_id<T: Tracker + ?Sized>(
        &mut self,
        tracker: &T,
        team_id: &str,
        name: &str,
    ) -> TrackerResult<Option<String>> {
        if !self.states.contains_key(team_id) {
            let states = tracker.workflow_states(team_id).await?;
            debug!(team_id, count = states.len(), "Fetched workflow states");
            self.states.insert(team_id.to_string(), states);
        }
        Ok(self.states.get(team_id).and_then(|states| {
            states
                .iter()
                .find(|s| s.name.trim().eq_ignore_ascii_case(name.trim()))
                .map(|s| s.id.clone())
        }))
    }

    /// Drop everything; the next lookup re-reads remote state.
    pub fn invalidate(&mut self) {
        self.teams.clear();
        self.states.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::MockTracker;

    fn label(id: &str, name: &str) -> Label {
        Label {
            id: id.to_string(),
            name: name.to_string(),
            color: None,
        }
    }

    #[test]
    fn test_label_map_is_case_insensitive() {
        let map = LabelMap::from_labels(vec![label("1", "Security"), label("2", "bug")]);
        assert_eq!(map.id("security"), Some("1"));
        assert_eq!(map.id(" SECURITY "), Some("1"));
        assert_eq!(map.id("Bug"), Some("2"));
        assert!(map.id("feature").is_none());
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_label_map_first_collision_wins() {
        let map = LabelMap::from_labels(vec![label("1", "Security"), label("2", "security")]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.id("security"), Some("1"));
    }

    #[test]
    fn test_label_map_labels_sorted() {
        let map = LabelMap::from_labels(vec![label("2", "frontend"), label("1", "api")]);
        let names: Vec<&str> = map.labels().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["api", "frontend"]);
    }

    #[test]
    fn test_label_map_serializes_names_to_ids() {
        let map = LabelMap::from_labels(vec![label("L-sec", "security"), label("L-bug", "bug")]);
        assert_eq!(
            serde_json::to_string(&map).unwrap(),
            r#"{"bug":"L-bug","security":"L-sec"}"#
        );
    }

    #[tokio::test]
    async fn test_team_lookup_is_cached() {
        let mut tracker = MockTracker::new();
        tracker.expect_find_team().times(1).returning(|id| {
            Ok(Team {
                id: id.to_string(),
                name: "Engineering".to_string(),
                key: "ENG".to_string(),
            })
        });

        let mut cache = LookupCache::new();
        let first = cache.team(&tracker, "team-1").await.unwrap();
        let second = cache.team(&tracker, "team-1").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_state_lookup_and_invalidate() {
        let mut tracker = MockTracker::new();
        tracker.expect_workflow_states().times(2).returning(|_| {
            Ok(vec![WorkflowState {
                id: "s-todo".to_string(),
                name: "Todo".to_string(),
                state_type: "unstarted".to_string(),
                position: 0.0,
            }])
        });

        let mut cache = LookupCache::new();
        assert_eq!(
            cache.state_id(&tracker, "t", "todo").await.unwrap(),
            Some("s-todo".to_string())
        );
        assert_eq!(cache.state_id(&tracker, "t", "Done").await.unwrap(), None);

        cache.invalidate();
        assert!(cache.state_id(&tracker, "t", "TODO").await.unwrap().is_some());
    }
}
