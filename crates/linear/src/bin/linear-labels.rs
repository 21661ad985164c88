//! linear-labels - label taxonomy and Linear label hygiene CLI.
//!
//! # Environment Variables
//!
//! - `LINEAR_API_KEY` - API key or OAuth token (required for remote commands;
//!   `LINEAR_OAUTH_TOKEN` is accepted as a fallback)
//! - `LINEAR_API_URL` - GraphQL endpoint override
//! - `LINEAR_LABEL_POLICY` - `strict` or `permissive` (default)
//!
//! # Examples
//!
//! ```bash
//! # Show the taxonomy
//! linear-labels list
//!
//! # Check a label set, suggest labels, pick agents
//! linear-labels validate bug security
//! linear-labels suggest "Fix authentication token leak"
//! linear-labels route security backend
//!
//! # Make sure labels exist on a team
//! linear-labels ensure <team-id> bug security --strict
//!
//! # Verify a project, or every project of an initiative
//! linear-labels project "Auth Hardening" 3 <initiative-id>
//! linear-labels all <initiative-id> auth
//!
//! # Create or converge a project from a JSON config
//! linear-labels provision <team-id> project.json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use linear::verify::{Overall, ProjectVerification};
use linear::{
    Config, CreateResult, EnsureOptions, EnsureResult, LabelPolicy, LabelSynchronizer,
    ProjectConfig, ProjectProvisioner, StepOutcome, Verifier,
};
use taxonomy::{
    route, suggest, validate, AgentId, AgentSelection, Category, LabelSuggestion,
    ValidationResult, TAXONOMY, TAXONOMY_VERSION,
};

/// Label taxonomy and Linear label hygiene.
#[derive(Parser)]
#[command(name = "linear-labels")]
#[command(about = "Label taxonomy, label sync, and project verification for Linear")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print JSON instead of a text report
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List taxonomy labels
    List {
        /// Only this category (domain, type, scope)
        #[arg(long, short)]
        category: Option<Category>,
    },

    /// Validate a label set against the taxonomy rules
    Validate {
        #[arg(required = true)]
        labels: Vec<String>,
    },

    /// Suggest labels for an issue title
    Suggest {
        title: String,

        /// Issue description
        #[arg(long, short)]
        description: Option<String>,
    },

    /// Pick agents for a label set
    Route {
        labels: Vec<String>,
    },

    /// Ensure labels exist on a team
    Ensure {
        team_id: String,

        #[arg(required = true)]
        labels: Vec<String>,

        /// Refuse labels outside the taxonomy (overrides `LINEAR_LABEL_POLICY`)
        #[arg(long)]
        strict: bool,
    },

    /// Verify a project
    Project {
        name: String,

        /// Minimum number of issues expected
        #[arg(default_value_t = 0)]
        count: usize,

        /// Initiative the project must be linked to
        initiative_id: Option<String>,
    },

    /// Verify every project of an initiative
    All {
        initiative_id: String,

        /// Only projects whose name contains this
        filter: Option<String>,

        /// Minimum number of issues per project
        #[arg(long, default_value_t = 1)]
        min_issues: usize,
    },

    /// Create or converge a project from a JSON config
    Provision {
        team_id: String,

        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("linear=info".parse()?))
        .init();

    let cli = Cli::parse();
    if !run(cli).await? {
        std::process::exit(1);
    }
    Ok(())
}

/// Execute a command; `Ok(false)` means it ran but checks did not pass.
async fn run(cli: Cli) -> Result<bool> {
    let json = cli.json;
    match cli.command {
        Commands::List { category } => {
            list(category, json)?;
            Ok(true)
        }
        Commands::Validate { labels } => {
            let result = validate(&labels);
            if json {
                print_json(&result)?;
            } else {
                print_validation(&result);
            }
            Ok(result.valid)
        }
        Commands::Suggest { title, description } => {
            let suggestions = suggest(&title, description.as_deref());
            if json {
                print_json(&suggestions)?;
            } else {
                print_suggestions(&suggestions);
            }
            Ok(true)
        }
        Commands::Route { labels } => {
            let selection = route(&labels);
            if json {
                print_json(&selection)?;
            } else {
                print_selection(&selection);
            }
            Ok(true)
        }
        Commands::Ensure {
            team_id,
            labels,
            strict,
        } => {
            let config = Config::from_env()?;
            let client = config.client()?;
            let opts = EnsureOptions {
                policy: if strict {
                    LabelPolicy::Strict
                } else {
                    config.label_policy
                },
            };
            let result = LabelSynchronizer::new(&client)
                .ensure_labels_exist(&team_id, &labels, opts)
                .await
                .with_context(|| format!("failed to ensure labels on team {team_id}"))?;
            if json {
                print_json(&result)?;
            } else {
                print_ensure(&result);
            }
            Ok(result.is_complete())
        }
        Commands::Project {
            name,
            count,
            initiative_id,
        } => {
            let client = Config::from_env()?.client()?;
            let report = Verifier::new(&client)
                .verify_project_creation(&name, count, None, initiative_id.as_deref())
                .await
                .with_context(|| format!("failed to verify project '{name}'"))?;
            if json {
                print_json(&report)?;
            } else {
                print_project(&report);
                print_overall(&report.overall);
            }
            Ok(report.overall.passed)
        }
        Commands::All {
            initiative_id,
            filter,
            min_issues,
        } => {
            let client = Config::from_env()?.client()?;
            let report = Verifier::new(&client)
                .verify_initiative(&initiative_id, filter.as_deref(), min_issues)
                .await
                .with_context(|| format!("failed to verify initiative {initiative_id}"))?;
            if json {
                print_json(&report)?;
            } else {
                for project in &report.projects {
                    print_project(project);
                    println!();
                }
                print_overall(&report.overall);
            }
            Ok(report.overall.passed)
        }
        Commands::Provision { team_id, config } => {
            let raw = std::fs::read_to_string(&config)
                .with_context(|| format!("failed to read {}", config.display()))?;
            let mut project: ProjectConfig = serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse {}", config.display()))?;

            let env = Config::from_env()?;
            if env.label_policy == LabelPolicy::Strict {
                project.label_policy = LabelPolicy::Strict;
            }
            debug!(issues = project.issues.len(), "Loaded project config");

            let client = env.client()?;
            let result = ProjectProvisioner::new(&client)
                .create_project(&team_id, &project)
                .await
                .with_context(|| format!("failed to provision '{}'", project.name))?;
            if json {
                print_json(&result)?;
            } else {
                print_provision(&result);
            }
            Ok(result.succeeded())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn agents(list: &[AgentId]) -> String {
    if list.is_empty() {
        return "-".to_string();
    }
    list.iter().map(|a| a.as_str()).collect::<Vec<_>>().join(", ")
}

fn list(category: Option<Category>, json: bool) -> Result<()> {
    let categories: Vec<Category> = category.map_or_else(|| Category::ALL.to_vec(), |c| vec![c]);

    if json {
        let labels: Vec<_> = categories
            .iter()
            .flat_map(|c| TAXONOMY.labels(*c).iter().copied())
            .collect();
        return print_json(&labels);
    }

    println!(
        "{} {}",
        "Label taxonomy".bold(),
        format!("v{TAXONOMY_VERSION}").dimmed()
    );
    for category in categories {
        println!();
        println!("{}", category.title().cyan().bold());
        for label in TAXONOMY.labels(category) {
            println!(
                "  {:<18} {}  {}",
                label.name.bold(),
                label.color.dimmed(),
                label.description
            );
            if category == Category::Domain {
                println!(
                    "  {:<18} primary: {}  secondary: {}",
                    "",
                    agents(label.primary_agents),
                    agents(label.secondary_agents).dimmed()
                );
            }
        }
    }
    Ok(())
}

fn print_validation(result: &ValidationResult) {
    if result.valid {
        println!("{} Label set is valid", "✓".green());
    } else {
        println!("{} Label set is invalid", "✗".red());
    }
    for error in &result.errors {
        println!("  {} {error}", "error:".red().bold());
    }
    for warning in &result.warnings {
        println!("  {} {warning}", "warning:".yellow().bold());
    }
    let parsed = &result.parsed;
    println!(
        "  domain: [{}]  type: [{}]  scope: [{}]",
        parsed.domain.join(", "),
        parsed.kind.join(", "),
        parsed.scope.join(", ")
    );
}

fn print_suggestions(suggestions: &[LabelSuggestion]) {
    if suggestions.is_empty() {
        println!("{}", "No labels suggested".yellow());
        return;
    }
    for s in suggestions {
        println!(
            "  {:<18} {:<7} {:.2}  {}",
            s.label.bold(),
            s.category.as_str(),
            s.confidence,
            s.reason.dimmed()
        );
    }
}

fn print_selection(selection: &AgentSelection) {
    println!("{} {}", "Primary:".bold(), agents(&selection.primary).green());
    println!("{} {}", "Secondary:".bold(), agents(&selection.secondary));
    println!("{} {}", "Reasoning:".bold(), selection.reasoning);
}

fn print_ensure(result: &EnsureResult) {
    for name in &result.created {
        println!("  {} {name} {}", "✓".green(), "(created)".dimmed());
    }
    for name in &result.existing {
        println!("  {} {name} {}", "✓".green(), "(exists)".dimmed());
    }
    for failed in &result.failed {
        println!("  {} {} {}", "✗".red(), failed.name, failed.error.red());
    }
    println!(
        "{} created, {} existing, {} failed",
        result.created.len(),
        result.existing.len(),
        result.failed.len()
    );
}

fn print_project(report: &ProjectVerification) {
    let Some(project) = &report.project else {
        println!("{} {}", "✗".red(), report.name.bold());
        return;
    };
    println!("{} {}", "Project".bold(), project.name.bold());
    if let Some(url) = &project.url {
        println!("  {}", url.dimmed());
    }
    check("description", project.has_description);
    if let Some(initiative) = &report.initiative {
        check(
            &format!("linked to {}", initiative.initiative_id),
            initiative.linked,
        );
    }
    check(
        &format!(
            "issues: {} (expected at least {})",
            report.issues.found, report.issues.expected
        ),
        report.issues.found >= report.issues.expected,
    );
    for issue in &report.labels {
        let label = match &issue.identifier {
            Some(identifier) => format!("{identifier} {}", issue.title),
            None => issue.title.clone(),
        };
        check(&label, issue.identifier.is_some() && issue.missing.is_empty());
    }
}

fn check(label: &str, ok: bool) {
    if ok {
        println!("  {} {label}", "✓".green());
    } else {
        println!("  {} {label}", "✗".red());
    }
}

fn print_overall(overall: &Overall) {
    if overall.passed {
        println!("{}", "All checks passed".green().bold());
        return;
    }
    println!("{}", format!("{} gap(s) found", overall.gaps.len()).red().bold());
    for gap in &overall.gaps {
        println!("  - {gap}");
    }
}

fn print_provision(result: &CreateResult) {
    for report in &result.steps {
        let step = report.step.as_str();
        match &report.outcome {
            StepOutcome::Done => println!("  {} {step}", "✓".green()),
            StepOutcome::AlreadyDone => {
                println!("  {} {step} {}", "✓".green(), "(already done)".dimmed());
            }
            StepOutcome::Skipped(reason) => {
                println!("  {} {step} {}", "-".yellow(), format!("(skipped: {reason})").dimmed());
            }
            StepOutcome::Failed(error) => println!("  {} {step} {}", "✗".red(), error.red()),
        }
    }

    println!();
    print_ensure(&result.labels);
    for issue in &result.issues.created {
        println!("  {} {} {}", "✓".green(), issue.identifier, issue.title);
    }
    for issue in &result.issues.existing {
        println!(
            "  {} {} {} {}",
            "✓".green(),
            issue.identifier,
            issue.title,
            "(exists)".dimmed()
        );
    }
    for failed in &result.issues.failed {
        println!("  {} {} {}", "✗".red(), failed.title, failed.error.red());
    }

    println!();
    print_project(&result.verification);
    print_overall(&result.verification.overall);
}
