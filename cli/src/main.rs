//! GraphRAG Viz CLI: operator commands for a GraphRAG project
//!
//! Exports the knowledge graph for the viewer, serves it, probes the LLM API,
//! runs the indexing job and queries the index.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use graphrag_viz::graph::GraphExporter;
use graphrag_viz::query::{render_result, run_examples, RenderLimits, EXAMPLE_QUERIES};
use graphrag_viz::workspace::{check_environment, has_index, project_status, Requirement};
use graphrag_viz::{
    CommandQueryEngine, ConnectivityProbe, HttpServer, IndexingJob, QueryEngine, SearchType,
    ToolkitConfig,
};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "graphrag-viz", version, about = "GraphRAG operator tooling")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, env = "GRAPHRAG_VIZ_CONFIG")]
    config: Option<PathBuf>,

    /// Project root (overrides workspace.root)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Export entities/relationships to the viewer's graph.json
    Export,
    /// Check connectivity to the hosted LLM API
    Probe,
    /// Run the GraphRAG indexing pipeline
    Index,
    /// Ask a single question
    Query {
        question: String,

        /// local, global or basic
        #[arg(long, short = 's', default_value = "local")]
        search_type: SearchType,
    },
    /// Run the built-in example queries
    Examples,
    /// Interactive question loop
    Ask,
    /// Show which pipeline outputs exist
    Status,
    /// Check the project environment
    Check,
    /// Serve the graph viewer
    Serve {
        /// Port (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Numbered interactive menu
    Menu,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match load_config(&cli) {
        Ok(config) => match cli.command {
            Commands::Export => run_export(&config, &cli.format),
            Commands::Probe => run_probe(&config, &cli.format).await,
            Commands::Index => run_index(&config).await,
            Commands::Query { question, search_type } => {
                run_query(&config, &question, search_type, &cli.format).await
            }
            Commands::Examples => run_example_queries(&config).await,
            Commands::Ask => run_ask(&config).await,
            Commands::Status => run_status(&config, &cli.format),
            Commands::Check => run_check(&config, &cli.format).map(|_| ()),
            Commands::Serve { port } => run_serve(&config, port).await,
            Commands::Menu => run_menu(&config).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<ToolkitConfig> {
    let mut config = ToolkitConfig::load(cli.config.as_deref()).context("loading configuration")?;
    config.apply_env();
    if let Some(root) = &cli.root {
        config.workspace.root = root.clone();
    }
    tracing::debug!("Project root: {}", config.workspace.root.display());
    Ok(config)
}

fn run_export(config: &ToolkitConfig, format: &OutputFormat) -> Result<()> {
    let exporter = GraphExporter::new(config.export_config());
    let summary = exporter.export().context("graph export failed")?;
    let stats = summary.document.stats();

    match format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "path": summary.path,
                "nodes": stats.nodes,
                "edges": stats.edges,
                "types": stats.types,
                "relationships_read": summary.relationships_read,
                "dropped": summary.dropped,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Table => {
            println!("Exported: {}", summary.path.display());
            println!("Nodes:    {}", stats.nodes);
            println!(
                "Edges:    {} ({} of {} relationships dropped)",
                stats.edges, summary.dropped, summary.relationships_read
            );

            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["Type", "Nodes"]);
            for (tag, count) in summary.document.tag_counts() {
                table.add_row(vec![tag.to_string(), count.to_string()]);
            }
            println!("{}", table);
        }
    }

    Ok(())
}

async fn run_probe(config: &ToolkitConfig, format: &OutputFormat) -> Result<()> {
    let probe = ConnectivityProbe::new(&config.llm)?;
    let report = probe.run().await;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            println!("Endpoint: {}", report.base_url);
            println!("Model:    {}", report.model);
            if let Some(key) = &report.api_key {
                println!("API key:  {}", key);
            }

            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["Check", "Target", "Status", "Result", "Time"]);
            for check in &report.checks {
                table.add_row(vec![
                    check.name.to_string(),
                    check.target.clone(),
                    check.status.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
                    format!("{} {}", if check.passed { "✓" } else { "✗" }, check.detail),
                    format!("{} ms", check.elapsed_ms),
                ]);
            }
            println!("{}", table);
        }
    }

    if !report.all_passed() {
        bail!(
            "{} of {} checks failed",
            report.checks.len() - report.passed_count(),
            report.checks.len()
        );
    }
    Ok(())
}

async fn run_index(config: &ToolkitConfig) -> Result<()> {
    if !run_check(config, &OutputFormat::Table)? {
        bail!("environment is not ready for indexing");
    }

    let job = IndexingJob::from_config(config);
    println!("\nRunning: {}", job.task().command_line());
    println!("This can take a while (timeout {}s)...", config.indexing.timeout_secs);

    job.run().await.context("indexing failed")?;
    println!(
        "✓ Indexing complete; tables written to {}",
        config.workspace.path(&config.workspace.output_dir).display()
    );
    Ok(())
}

async fn run_query(
    config: &ToolkitConfig,
    question: &str,
    search_type: SearchType,
    format: &OutputFormat,
) -> Result<()> {
    let engine = CommandQueryEngine::from_config(config);
    let result = engine.query(question, search_type).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Table => println!("{}", render_result(&result, RenderLimits::EXAMPLES)),
    }
    Ok(())
}

fn require_index(config: &ToolkitConfig) -> Result<()> {
    if !has_index(&config.workspace) {
        bail!("no index found; run `graphrag-viz index` first");
    }
    Ok(())
}

async fn run_example_queries(config: &ToolkitConfig) -> Result<()> {
    require_index(config)?;
    let engine = CommandQueryEngine::from_config(config);
    let outcomes = run_examples(&engine, &EXAMPLE_QUERIES).await;

    let rule = "-".repeat(40);
    let mut failures = 0;
    for (i, outcome) in outcomes.iter().enumerate() {
        println!("\n[Query {}] {}", i + 1, outcome.example.description);
        println!("Question:    {}", outcome.example.question);
        println!("Search type: {}", outcome.example.search_type);
        println!("{}", rule);
        match &outcome.result {
            Ok(result) => println!("{}", render_result(result, RenderLimits::EXAMPLES)),
            Err(e) => {
                failures += 1;
                println!("✗ Query failed: {}", e);
            }
        }
        println!("{}", rule);
    }

    if failures > 0 {
        bail!("{} of {} example queries failed", failures, outcomes.len());
    }
    Ok(())
}

/// Print `label` and read one trimmed line; `None` on end of input
fn prompt(label: &str) -> Result<Option<String>> {
    print!("{}", label);
    std::io::stdout().flush()?;

    let mut line = String::new();
    if std::io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

async fn run_ask(config: &ToolkitConfig) -> Result<()> {
    require_index(config)?;
    let engine = CommandQueryEngine::from_config(config);

    println!("Interactive query mode. Type 'quit' or 'exit' to leave.");

    loop {
        let Some(question) = prompt("\nquestion> ")? else {
            break; // EOF
        };
        if question.is_empty() {
            continue;
        }
        if matches!(question.to_lowercase().as_str(), "quit" | "exit" | "退出") {
            break;
        }

        println!("Search type: 1. local  2. global  3. basic");
        let choice = prompt("choice [1]> ")?.unwrap_or_default();
        let search_type = SearchType::from_menu_choice(&choice);

        println!("Searching ({})...", search_type);
        match engine.query(&question, search_type).await {
            Ok(result) => println!("\n{}", render_result(&result, RenderLimits::INTERACTIVE)),
            Err(e) => eprintln!("✗ Query failed: {}", e),
        }
    }

    println!("Bye!");
    Ok(())
}

fn run_status(config: &ToolkitConfig, format: &OutputFormat) -> Result<()> {
    let artifacts = project_status(&config.workspace);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&artifacts)?),
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["", "Artifact", "Size"]);
            for artifact in &artifacts {
                let (mark, size) = match artifact.size {
                    Some(bytes) => ("✓", format!("{} bytes", bytes)),
                    None => ("✗", "missing".to_string()),
                };
                table.add_row(vec![mark.to_string(), artifact.name.clone(), size]);
            }
            println!("{}", table);
        }
    }
    Ok(())
}

/// Print the environment report and return whether indexing can start
fn run_check(config: &ToolkitConfig, format: &OutputFormat) -> Result<bool> {
    let report = check_environment(&config.workspace);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => {
            for check in &report.checks {
                let mark = match (check.present, check.requirement) {
                    (true, _) => "✓",
                    (false, Requirement::Required) => "✗",
                    (false, Requirement::Advisory) => "⚠",
                };
                println!("{} {} ({})", mark, check.name, check.path.display());
                if !check.present {
                    println!("    {}", check.hint);
                }
            }
        }
    }
    Ok(report.ready())
}

async fn run_serve(config: &ToolkitConfig, port: Option<u16>) -> Result<()> {
    let mut server_config = config.server.clone();
    if let Some(port) = port {
        server_config.port = port;
    }

    let graph_path = config.export_config().graph_path();
    if !graph_path.is_file() {
        eprintln!(
            "Warning: {} does not exist yet; run `graphrag-viz export`",
            graph_path.display()
        );
    }

    HttpServer::new(server_config, graph_path)
        .start()
        .await
        .context("viewer server stopped")?;
    Ok(())
}

async fn run_menu(config: &ToolkitConfig) -> Result<()> {
    println!("GraphRAG quick start");
    println!("{}", "=".repeat(50));

    loop {
        println!("\nChoose an action:");
        println!("  1. Check environment");
        println!("  2. Run indexing (build the knowledge graph)");
        println!("  3. Run example queries");
        println!("  4. Show project status");
        println!("  5. Exit");

        let Some(choice) = prompt("\nchoice (1-5)> ")? else {
            break; // EOF
        };

        let outcome = match choice.as_str() {
            "1" => run_check(config, &OutputFormat::Table).map(|_| ()),
            "2" => run_index(config).await,
            "3" => run_example_queries(config).await,
            "4" => run_status(config, &OutputFormat::Table),
            "5" => break,
            _ => {
                println!("Invalid choice, try again");
                Ok(())
            }
        };

        if let Err(e) = outcome {
            eprintln!("Error: {:#}", e);
        }
    }

    println!("Bye!");
    Ok(())
}
