//! Idempotent label synchronization.
//!
//! Ensures a set of label names exists on a team and applies labels to issues.
//! Remote creation is not exclusive: another process can create the same
//! label between our read and our write. A `Duplicate` on creation therefore
//! means "someone else won", and the winner's ID is adopted after re-reading.

use serde::{Deserialize, Serialize};
use taxonomy::TAXONOMY;
use tracing::{debug, info, instrument, warn};

use crate::cache::LabelMap;
use crate::error::TrackerResult;
use crate::models::LabelCreateInput;
use crate::tracker::Tracker;

/// Whether labels outside the taxonomy may be created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelPolicy {
    /// Create anything requested; unknown names are logged.
    #[default]
    Permissive,
    /// Refuse the whole batch if any name is outside the taxonomy.
    Strict,
}

impl std::str::FromStr for LabelPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "permissive" => Ok(Self::Permissive),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown label policy '{other}' (expected strict or permissive)")),
        }
    }
}

/// Options for [`LabelSynchronizer::ensure_labels_exist`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EnsureOptions {
    pub policy: LabelPolicy,
}

impl EnsureOptions {
    #[must_use]
    pub fn strict() -> Self {
        Self {
            policy: LabelPolicy::Strict,
        }
    }
}

/// A label that could not be ensured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedLabel {
    pub name: String,
    pub error: String,
}

/// Outcome of one ensure run. Partial success is the normal case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsureResult {
    /// Names created by this run
    pub created: Vec<String>,
    /// Names that already existed (including races lost to another writer)
    pub existing: Vec<String>,
    pub failed: Vec<FailedLabel>,
    /// Every label of the team known after the run, as name to ID
    pub label_map: LabelMap,
}

impl EnsureResult {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of applying labels to one issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyResult {
    /// Names newly attached
    pub applied: Vec<String>,
    /// Names not attached, each suffixed with the reason
    pub skipped: Vec<String>,
}

/// Drives label creation and attachment against a [`Tracker`].
pub struct LabelSynchronizer<'a, T: Tracker + ?Sized> {
    tracker: &'a T,
}

impl<'a, T: Tracker + ?Sized> LabelSynchronizer<'a, T> {
    #[must_use]
    pub fn new(tracker: &'a T) -> Self {
        Self { tracker }
    }

    /// Make sure every name in `names` exists as a label on `team_id`.
    ///
    /// Names are processed in order and de-duplicated case-insensitively (the
    /// first spelling wins). Per-name failures land in `failed` without
    /// stopping the batch.
    ///
    /// # Errors
    /// Only the initial label listing is fatal; nothing can be decided without it.
    #[instrument(skip(self, names, opts), fields(team_id = %team_id, count = names.len()))]
    pub async fn ensure_labels_exist<S: AsRef<str>>(
        &self,
        team_id: &str,
        names: &[S],
        opts: EnsureOptions,
    ) -> TrackerResult<EnsureResult> {
        let requested = dedupe(names);

        if opts.policy == LabelPolicy::Strict {
            let unknown: Vec<FailedLabel> = requested
                .iter()
                .filter(|name| !TAXONOMY.contains(name))
                .map(|name| FailedLabel {
                    name: name.clone(),
                    error: format!("'{name}' is not in the label taxonomy (strict mode)"),
                })
                .collect();
            if !unknown.is_empty() {
                warn!(
                    unknown = unknown.len(),
                    "Strict label policy rejected batch before touching the tracker"
                );
                return Ok(EnsureResult {
                    failed: unknown,
                    ..EnsureResult::default()
                });
            }
        }

        let mut result = EnsureResult {
            label_map: LabelMap::from_labels(self.tracker.list_labels(team_id).await?),
            ..EnsureResult::default()
        };
        debug!(known = result.label_map.len(), "Loaded team labels");

        for name in requested {
            if result.label_map.contains(&name) {
                result.existing.push(name);
                continue;
            }

            let definition = TAXONOMY.get(&name);
            if definition.is_none() {
                warn!(label = %name, "Creating label outside the taxonomy");
            }

            let input = LabelCreateInput {
                team_id: team_id.to_string(),
                name: name.clone(),
                color: TAXONOMY.color_for(&name).to_string(),
                description: definition.map(|d| d.description.to_string()),
            };

            match self.tracker.create_label(input).await {
                Ok(label) => {
                    info!(label = %label.name, id = %label.id, "Created label");
                    result.label_map.insert(label);
                    result.created.push(name);
                }
                Err(err) if err.is_duplicate() => {
                    warn!(label = %name, "Label created concurrently, re-reading team labels");
                    self.adopt_concurrent(team_id, name, &mut result).await;
                }
                Err(err) => {
                    warn!(label = %name, error = %err, "Failed to create label");
                    result.failed.push(FailedLabel {
                        name,
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            created = result.created.len(),
            existing = result.existing.len(),
            failed = result.failed.len(),
            "Label sync complete"
        );
        Ok(result)
    }

    /// Resolve a label someone else created while we were trying to.
    async fn adopt_concurrent(&self, team_id: &str, name: String, result: &mut EnsureResult) {
        match self.tracker.list_labels(team_id).await {
            Ok(labels) => {
                let refreshed = LabelMap::from_labels(labels);
                if let Some(label) = refreshed.get(&name) {
                    debug!(label = %name, id = %label.id, "Adopted concurrently created label");
                    result.label_map = refreshed;
                    result.existing.push(name);
                } else {
                    result.failed.push(FailedLabel {
                        error: "tracker reported a duplicate but the label is not listed"
                            .to_string(),
                        name,
                    });
                }
            }
            Err(err) => result.failed.push(FailedLabel {
                name,
                error: format!("re-reading labels after duplicate failed: {err}"),
            }),
        }
    }

    /// Attach labels to an issue, keeping everything already on it.
    ///
    /// The tracker replaces the label set on update, so the full union of
    /// current and new IDs is always sent. No update is made when nothing new
    /// would be attached.
    ///
    /// # Errors
    /// Reading the issue's labels or the final update failing is fatal.
    #[instrument(skip(self, names, label_map), fields(issue_id = %issue_id))]
    pub async fn apply_labels_to_issue<S: AsRef<str>>(
        &self,
        issue_id: &str,
        names: &[S],
        label_map: &LabelMap,
    ) -> TrackerResult<ApplyResult> {
        let current = self.tracker.issue_labels(issue_id).await?;
        let mut label_ids: Vec<String> = current.into_iter().map(|l| l.id).collect();
        let mut result = ApplyResult::default();

        for name in names {
            let name = name.as_ref().trim();
            match label_map.id(name) {
                None => result.skipped.push(format!("{name} (not found in label map)")),
                Some(id) if label_ids.iter().any(|existing| existing == id) => {
                    result.skipped.push(format!("{name} (already applied)"));
                }
                Some(id) => {
                    label_ids.push(id.to_string());
                    result.applied.push(name.to_string());
                }
            }
        }

        if result.applied.is_empty() {
            debug!(skipped = result.skipped.len(), "No new labels to apply");
            return Ok(result);
        }

        self.tracker.set_issue_labels(issue_id, label_ids).await?;
        info!(
            applied = result.applied.len(),
            skipped = result.skipped.len(),
            "Applied labels to issue"
        );
        Ok(result)
    }
}

/// Trim, drop blanks, and drop case-insensitive repeats keeping the first spelling.
fn dedupe<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names
        .iter()
        .map(|n| n.as_ref().trim())
        .filter(|n| !n.is_empty() && seen.insert(n.to_lowercase()))
        .map(str::to_string)
        .collect()
}
