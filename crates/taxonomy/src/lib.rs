//! Issue label taxonomy for the multi-agent development workflow.
//!
//! This crate provides:
//! - The static label taxonomy (domain, type and scope categories)
//! - Label-set validation against the recommended issue shape
//! - Keyword-based label suggestion from free text
//! - Agent routing from domain labels
//!
//! Everything here is pure: no IO, no clocks, no randomness.
//!
//! # Example
//!
//! ```
//! use taxonomy::{route, suggest, validate, AgentId};
//!
//! let suggestions = suggest("Fix authentication token leak", None);
//! let labels: Vec<&str> = suggestions.iter().map(|s| s.label).collect();
//!
//! assert!(validate(&labels).valid);
//! assert_eq!(route(&labels).top(), Some(AgentId::SecurityManager));
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod label;
pub mod registry;
pub mod route;
pub mod suggest;
pub mod validate;

pub use label::{normalize, AgentId, Category, LabelDefinition, ParseError, TaxonomyLabel};
pub use registry::{Taxonomy, DEFAULT_LABEL_COLOR, TAXONOMY, TAXONOMY_VERSION};
pub use route::{route, AgentSelection, GENERAL_POOL_PRIMARY, GENERAL_POOL_SECONDARY};
pub use suggest::{suggest, LabelSuggestion, MAX_CONFIDENCE};
pub use validate::{validate, ParsedLabels, ValidationResult};
