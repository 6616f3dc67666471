//! Lumina CLI
//!
//! Command-line surface over the lineage engine:
//! - inspect the catalog (`show`, `alerts`)
//! - trace incidents (`impact`, `root-cause`, `time-travel`)
//! - manage ingestion (`sources`, `delete`)
//! - ask the assistant (`ask`)
//!
//! State is process-lifetime only: every invocation starts from the seed
//! catalog, applies its mutations in memory, and prints the outcome.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use lumina_assistant::{AssistantPort, GeminiClient, GraphContext};
use lumina_graph::{
    demo_overrides, derive_incidents, downstream_closure, project, seed::seed_graph,
    upstream_error_closure, HealthStatus, LineageGraph, Severity, MAX_TIME_TRAVEL_DAYS,
};
use lumina_ingest::{sync_source, MockConnector, SourceKind, SourceRegistry, SyncStatus};

#[derive(Parser)]
#[command(name = "lumina")]
#[command(author, version, about = "Lumina: data lineage observability")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the catalog, or show one asset in detail.
    Show {
        /// Asset id (e.g. `stg_events`). Omit to list everything.
        id: Option<String>,
    },
    /// Downstream impact: every asset fed by the given one.
    Impact { id: String },
    /// Upstream root cause: trace the error path feeding the given asset.
    RootCause { id: String },
    /// Project health statuses as they looked N days ago (0-5).
    TimeTravel { days: u8 },
    /// Active incidents derived from the live graph.
    Alerts,
    /// Connect a mock source and ingest its metadata.
    Sources {
        #[command(subcommand)]
        command: SourceCommands,
    },
    /// Remove an asset and all lineage through it.
    Delete { id: String },
    /// Ask the assistant about the current graph.
    Ask {
        query: String,
        /// Focus the analysis on one asset.
        #[arg(long)]
        selected: Option<String>,
        /// Print the serialized context instead of calling the service.
        #[arg(long)]
        show_context: bool,
    },
}

#[derive(Subcommand)]
enum SourceCommands {
    /// List available integration kinds.
    List,
    /// Connect the given kind and run one sync into the seed catalog.
    Sync {
        kind: KindArg,
        /// Simulate a connector failure.
        #[arg(long)]
        fail: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Snowflake,
    Postgres,
    Bigquery,
    Dbt,
    Tableau,
}

impl From<KindArg> for SourceKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Snowflake => SourceKind::Snowflake,
            KindArg::Postgres => SourceKind::Postgres,
            KindArg::Bigquery => SourceKind::BigQuery,
            KindArg::Dbt => SourceKind::Dbt,
            KindArg::Tableau => SourceKind::Tableau,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut graph = seed_graph();

    match cli.command {
        Commands::Show { id } => show(&graph, id.as_deref())?,
        Commands::Impact { id } => impact(&graph, &id)?,
        Commands::RootCause { id } => root_cause(&graph, &id)?,
        Commands::TimeTravel { days } => time_travel(&graph, days),
        Commands::Alerts => alerts(&graph),
        Commands::Sources { command } => sources(&mut graph, command).await?,
        Commands::Delete { id } => delete(&mut graph, &id),
        Commands::Ask {
            query,
            selected,
            show_context,
        } => ask(&graph, &query, selected.as_deref(), show_context).await?,
    }
    Ok(())
}

fn status_tag(status: HealthStatus) -> colored::ColoredString {
    match status {
        HealthStatus::Healthy => "HEALTHY".green(),
        HealthStatus::Warning => "WARNING".yellow(),
        HealthStatus::Error => "ERROR".red().bold(),
    }
}

fn require_node(graph: &LineageGraph, id: &str) -> Result<()> {
    if graph.contains_node(id) {
        Ok(())
    } else {
        Err(anyhow!("no asset with id {id:?} (try `lumina show`)"))
    }
}

fn show(graph: &LineageGraph, id: Option<&str>) -> Result<()> {
    match id {
        None => {
            println!(
                "{} assets, {} lineage edges\n",
                graph.node_count(),
                graph.edge_count()
            );
            for node in graph.nodes() {
                println!(
                    "  {:<16} {:<22} {:<10} {}",
                    node.id.cyan(),
                    node.label,
                    format!("{:?}", node.kind).to_lowercase(),
                    status_tag(node.status),
                );
            }
        }
        Some(id) => {
            let Some(node) = graph.node(id) else {
                return Err(anyhow!("no asset with id {id:?} (try `lumina show`)"));
            };
            println!("{} ({})", node.label.bold(), node.id.cyan());
            println!("  status     {}", status_tag(node.status));
            println!("  owner      {}", node.owner);
            println!("  freshness  {}", node.freshness);
            println!("  quality    {}/100", node.quality_score);
            if let Some(rows) = node.row_count {
                println!("  rows       {rows}");
            }
            if !node.tags.is_empty() {
                println!("  tags       {}", node.tags.join(", "));
            }
            println!("  {}", node.description.dimmed());
            if !node.schema.is_empty() {
                println!("  schema:");
                for col in &node.schema {
                    let pii = if col.is_pii { " [PII]".red().to_string() } else { String::new() };
                    println!("    {:<16} {:<10} {}{pii}", col.name, col.column_type, col.description.dimmed());
                }
            }
        }
    }
    Ok(())
}

fn impact(graph: &LineageGraph, id: &str) -> Result<()> {
    require_node(graph, id)?;
    let closure = downstream_closure(id, graph.edges());
    println!(
        "{} downstream of {} ({} of {} assets):",
        "Impact".blue().bold(),
        id.cyan(),
        closure.len(),
        graph.node_count()
    );
    for member in &closure {
        if let Some(node) = graph.node(member) {
            println!("  {:<16} {}", member.cyan(), status_tag(node.status));
        }
    }
    Ok(())
}

fn root_cause(graph: &LineageGraph, id: &str) -> Result<()> {
    require_node(graph, id)?;
    let closure = upstream_error_closure(id, graph.nodes(), graph.edges());
    if closure.is_empty() {
        println!(
            "{} is healthy — no error path upstream.",
            id.cyan()
        );
        return Ok(());
    }
    println!(
        "{} error path feeding {}:",
        "Root cause".red().bold(),
        id.cyan()
    );
    for member in &closure {
        if let Some(node) = graph.node(member) {
            println!(
                "  {:<16} {:<8} {}",
                member.cyan(),
                status_tag(node.status),
                node.description.dimmed()
            );
        }
    }
    Ok(())
}

fn time_travel(graph: &LineageGraph, days: u8) {
    let days = days.min(MAX_TIME_TRAVEL_DAYS);
    let projected = project(graph, &demo_overrides(), days);
    let when = if days == 0 {
        "now".to_string()
    } else {
        format!("{days}d ago")
    };
    println!("Status view at {}:", when.bold());
    for node in graph.nodes() {
        let shown = projected[&node.id];
        let marker = if shown != node.status { " (projected)".dimmed().to_string() } else { String::new() };
        println!("  {:<16} {}{marker}", node.id.cyan(), status_tag(shown));
    }
}

fn alerts(graph: &LineageGraph) {
    let incidents = derive_incidents(graph);
    if incidents.is_empty() {
        println!("{}", "No active incidents.".green());
        return;
    }
    println!("{} active incidents:\n", incidents.len());
    for incident in incidents {
        let severity = match incident.severity {
            Severity::Critical => "CRITICAL".red().bold(),
            Severity::Warning => "WARNING".yellow(),
        };
        println!("  [{severity}] {}", incident.title.bold());
        println!("    source: {}", incident.source_id.cyan());
        if !incident.description.is_empty() {
            println!("    {}", incident.description.dimmed());
        }
    }
}

async fn sources(graph: &mut LineageGraph, command: SourceCommands) -> Result<()> {
    match command {
        SourceCommands::List => {
            println!("Available integrations:");
            for kind in SourceKind::ALL {
                println!("  {}", kind.as_str().cyan());
            }
        }
        SourceCommands::Sync { kind, fail } => {
            let kind: SourceKind = kind.into();
            let connector = if fail {
                MockConnector::new().with_failure(kind)
            } else {
                MockConnector::new()
            };
            let mut registry = SourceRegistry::new();
            let id = registry
                .connect_source(&connector, kind, &serde_json::json!({}))
                .await
                .ok_or_else(|| anyhow!("connection to {} was rejected", kind.as_str()))?;

            match sync_source(&mut registry, graph, &connector, &id).await? {
                SyncStatus::Merged { outcome, summary } => {
                    println!("{} {summary}", "Synced:".green().bold());
                    println!(
                        "  +{} assets, +{} edges ({} dangling dropped)",
                        outcome.nodes_added, outcome.edges_added, outcome.edges_dropped
                    );
                    println!(
                        "  catalog now has {} assets / {} edges",
                        graph.node_count(),
                        graph.edge_count()
                    );
                }
                SyncStatus::Failed => {
                    println!(
                        "{} {} sync failed; source marked error, graph unchanged.",
                        "Error:".red().bold(),
                        kind.as_str(),
                    );
                }
            }
        }
    }
    Ok(())
}

fn delete(graph: &mut LineageGraph, id: &str) {
    if graph.remove_node(id) {
        println!(
            "Removed {}; {} assets / {} edges remain.",
            id.cyan(),
            graph.node_count(),
            graph.edge_count()
        );
    } else {
        println!("Nothing to do: no asset with id {id:?}.");
    }
}

async fn ask(
    graph: &LineageGraph,
    query: &str,
    selected: Option<&str>,
    show_context: bool,
) -> Result<()> {
    let context = GraphContext::from_graph(graph, selected);
    if show_context {
        println!("{}", serde_json::to_string_pretty(&context)?);
        return Ok(());
    }
    let client = GeminiClient::from_env().map_err(|e| anyhow!("assistant init failed: {e}"))?;
    let reply = client.analyze(query, &context).await;
    println!("{reply}");
    Ok(())
}
