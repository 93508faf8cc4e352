use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use config::PersonaConfig;
use persona_discovery::{DiscoveryEngine, ReplayScript};
use persona_graph::{build_nodes, score_coverage, PersonaNode, RawNode};
use persona_layout::{InteractionState, LayoutKind};
use serde::Deserialize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

mod config;

#[derive(Parser)]
#[command(name = "persona")]
#[command(about = "Persona discovery graph: coverage, layouts and session replay", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    /// TOML file with [edges], [layout.radial] and [layout.force] sections
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive edges from a node fixture and print coverage
    Score(ScoreArgs),

    /// Lay out a node fixture and print positions and edge styles
    Layout(LayoutArgs),

    /// Drive a discovery session from a recorded script
    Replay(ReplayArgs),
}

#[derive(Args)]
struct ScoreArgs {
    /// JSON file: an array of raw nodes or `{ "nodes": [...] }`
    graph: PathBuf,
}

#[derive(Args)]
struct LayoutArgs {
    /// JSON file: an array of raw nodes or `{ "nodes": [...] }`
    graph: PathBuf,

    /// Layout engine: radial|force
    #[arg(long, default_value = "radial")]
    engine: LayoutKind,

    /// Selected node id
    #[arg(long)]
    selected: Option<String>,

    /// Hovered node id
    #[arg(long)]
    hovered: Option<String>,

    /// Show every detail node regardless of focus
    #[arg(long)]
    show_all_details: bool,
}

#[derive(Args)]
struct ReplayArgs {
    /// JSON replay script: `{ "snapshot": {...}, "steps": [...] }`
    script: PathBuf,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GraphFile {
    Wrapped { nodes: Vec<RawNode> },
    Bare(Vec<RawNode>),
}

fn read_nodes(path: &Path) -> Result<Vec<PersonaNode>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read graph {}", path.display()))?;
    let file: GraphFile = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid graph JSON in {}", path.display()))?;
    let raw_nodes = match file {
        GraphFile::Wrapped { nodes } | GraphFile::Bare(nodes) => nodes,
    };
    let nodes = build_nodes(&raw_nodes);
    if nodes.len() < raw_nodes.len() {
        log::warn!(
            "Skipped {} malformed or duplicate nodes in {}",
            raw_nodes.len() - nodes.len(),
            path.display()
        );
    }
    Ok(nodes)
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_score(args: ScoreArgs, config: &PersonaConfig) -> Result<()> {
    let nodes = read_nodes(&args.graph)?;
    let edges = config.edge_builder().build(&nodes);
    let coverage = score_coverage(&nodes, &edges);
    log::info!(
        "Scored {} nodes / {} edges: overall {:.1}%",
        nodes.len(),
        edges.len(),
        coverage.overall
    );
    print_json(&json!({
        "nodes": nodes,
        "edges": edges,
        "coverage": coverage,
    }))
}

fn run_layout(args: LayoutArgs, config: &PersonaConfig) -> Result<()> {
    let nodes = read_nodes(&args.graph)?;
    let edges = config.edge_builder().build(&nodes);
    let interaction = InteractionState {
        selected_id: args.selected,
        hovered_id: args.hovered,
        show_all_details: args.show_all_details,
    };
    let result = config
        .layouts()
        .layout(args.engine, &nodes, &edges, &interaction);
    log::info!(
        "{} layout placed {} nodes ({} visible)",
        args.engine.as_str(),
        result.positions.len(),
        result.visible_ids().len()
    );
    print_json(&json!({
        "engine": args.engine,
        "layout": result,
    }))
}

async fn run_replay(args: ReplayArgs, config: &PersonaConfig) -> Result<()> {
    let raw = fs::read_to_string(&args.script)
        .with_context(|| format!("Failed to read script {}", args.script.display()))?;
    let script: ReplayScript = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid replay script {}", args.script.display()))?;

    let mut engine = DiscoveryEngine::from_script(&script)
        .await
        .context("Failed to load the script snapshot")?
        .with_edge_builder(config.edge_builder())
        .with_layouts(config.layouts());
    let steps = engine.replay(&script.steps).await;

    let failed = steps.iter().filter(|s| s.error.is_some()).count();
    log::info!("Replayed {} steps ({failed} failed)", steps.len());

    print_json(&json!({
        "steps": steps,
        "state": engine.state(),
        "edges": engine.edges(),
        "coverage": engine.coverage(),
        "progress": engine.progress(),
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = PersonaConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Score(args) => run_score(args, &config)?,
        Commands::Layout(args) => run_layout(args, &config)?,
        Commands::Replay(args) => run_replay(args, &config).await?,
    }

    Ok(())
}
