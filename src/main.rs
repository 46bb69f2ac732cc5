#![warn(clippy::all, rust_2018_idioms)]

use std::sync::Arc;

use promptdash::app::export::write_export;
use promptdash::app::prompt_explorer::{CatalogClient, Projection, PromptExplorer};
use promptdash::app::server::ViewServer;
use tracing_subscriber::prelude::*;

const DEFAULT_CATALOG_URL: &str = "http://127.0.0.1:3000/api/prompts";
const DEFAULT_SERVE_PORT: u16 = 3000;

fn init_logging() {
    if let Some(proj_dirs) = directories::ProjectDirs::from("com", "", "promptdash") {
        let log_dir = proj_dirs.data_dir().join("logs");
        let _ = std::fs::create_dir_all(&log_dir);

        let log_path = log_dir.join("promptdash.log");
        let file = match std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&log_path)
        {
            Ok(file) => file,
            Err(e) => {
                eprintln!("Warning: could not open log file {:?}: {}", log_path, e);
                return;
            }
        };

        let filter = tracing_subscriber::EnvFilter::builder()
            .parse("promptdash=info,hyper=warn,reqwest=warn,tower_http=info")
            .expect("Failed to parse env filter");

        let subscriber = tracing_subscriber::registry().with(filter).with(
            tracing_subscriber::fmt::layer()
                .with_writer(move || file.try_clone().expect("Failed to clone file handle"))
                .with_ansi(false), // No ANSI colors in file
        );

        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");

        // Bridge log crate events to tracing (for the log_* macros and deps)
        tracing_log::LogTracer::init().expect("Failed to initialize log-to-tracing bridge");

        tracing::info!("Logging initialized to: {:?}", log_path);
    }
}

fn setup_panic_handler() {
    // Write panic info to a crash log even if logging never initialized
    std::panic::set_hook(Box::new(|panic_info| {
        let crash_msg = format!(
            "Prompt Dash crashed!\n\
             Panic occurred at: {}\n\
             Details: {}\n",
            panic_info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                .unwrap_or_else(|| "unknown location".to_string()),
            panic_info
                .payload()
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| panic_info
                    .payload()
                    .downcast_ref::<String>()
                    .map(|s| s.as_str()))
                .unwrap_or("unknown panic"),
        );

        if let Some(proj_dirs) = directories::ProjectDirs::from("com", "", "promptdash") {
            let log_dir = proj_dirs.data_dir().join("logs");
            let _ = std::fs::create_dir_all(&log_dir);
            let crash_log_path = log_dir.join("crash.log");

            if let Ok(mut file) = std::fs::OpenOptions::new()
                .append(true)
                .create(true)
                .open(&crash_log_path)
            {
                use std::io::Write;
                let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
                let _ = writeln!(file, "\n=== CRASH at {} ===\n{}", timestamp, crash_msg);
            }
        }
        eprintln!("\n{}", crash_msg);
    }));
}

fn flag_value(args: &[String], name: &str) -> Option<String> {
    args.windows(2)
        .find(|pair| pair[0] == name)
        .map(|pair| pair[1].clone())
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|arg| arg == name)
}

fn print_help() {
    println!(
        "Prompt Dash - prompt catalog aggregation\n\
         \n\
         USAGE:\n\
         promptdash <command> [options]\n\
         \n\
         COMMANDS:\n\
         list      Print the grouped catalog\n\
         stats     Print catalog statistics\n\
         export    Export the catalog to a JSON file\n\
         web       Serve the aggregated catalog over HTTP\n\
         \n\
         OPTIONS:\n\
         --api-url <URL>       Catalog endpoint (default {})\n\
         --projection <NAME>   function | project | run (default function)\n\
         --search <TERM>       Free-text filter\n\
         --function <NAME>     Scope results to a function name\n\
         --verbose             Include prompt bodies in list output\n\
         --output <FILE>       Export file name (default prompts_export.json)\n\
         --port <N>            Serve port for web (default {})",
        DEFAULT_CATALOG_URL, DEFAULT_SERVE_PORT
    );
}

async fn load_explorer(api_url: &str) -> anyhow::Result<(Arc<PromptExplorer>, Arc<CatalogClient>)> {
    let explorer = Arc::new(PromptExplorer::new());
    let client = Arc::new(CatalogClient::new()?);
    explorer.refresh(&client, api_url).await?;
    Ok((explorer, client))
}

async fn run_list(args: &[String]) -> anyhow::Result<()> {
    let api_url = flag_value(args, "--api-url").unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string());
    let projection = match flag_value(args, "--projection") {
        Some(name) => Projection::parse(&name)
            .ok_or_else(|| anyhow::anyhow!("unknown projection {:?}", name))?,
        None => Projection::ByFunctionVersion,
    };
    let search = flag_value(args, "--search").unwrap_or_default();
    let scope = flag_value(args, "--function");
    let verbose = has_flag(args, "--verbose");

    let (explorer, _client) = load_explorer(&api_url).await?;
    let view = explorer.view_with(projection, &search, scope.as_deref());

    if view.groups.is_empty() {
        println!("No prompts matched.");
        return Ok(());
    }

    println!(
        "📊 {} prompts, {} groups ({} matching)",
        view.stats.total_records, view.stats.total_groups, view.stats.filtered_count
    );
    for group in &view.groups {
        println!(
            "\n🔧 {} ({} prompts, latest agent v{})",
            group.group_key, group.aggregates.count, group.aggregates.max_agent_version
        );
        if !group.aggregates.tags.is_empty() {
            let tags: Vec<&str> = group.aggregates.tags.iter().map(String::as_str).collect();
            println!("   Tags: {}", tags.join(", "));
        }
        for member in &group.members {
            println!(
                "  📄 {} (agent v{}) - {}",
                member.key,
                member.agent_version,
                if member.description.is_empty() {
                    "no description"
                } else {
                    &member.description
                }
            );
            println!("      Created: {}", member.created_at);
            if verbose {
                println!("      Prompt: {}", member.prompt);
            }
        }
    }
    Ok(())
}

async fn run_stats(args: &[String]) -> anyhow::Result<()> {
    let api_url = flag_value(args, "--api-url").unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string());
    let (explorer, _client) = load_explorer(&api_url).await?;
    let report = explorer.stats_report();

    println!(
        "📊 {} prompts across {} functions",
        report.total_prompts, report.total_functions
    );
    for (name, summary) in &report.functions {
        println!(
            "  {} - {} versions, latest {}{}",
            name,
            summary.count,
            if summary.latest_version.is_empty() {
                "unassigned"
            } else {
                &summary.latest_version
            },
            if summary.tags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", summary.tags.join(", "))
            }
        );
    }
    Ok(())
}

async fn run_export(args: &[String]) -> anyhow::Result<()> {
    let api_url = flag_value(args, "--api-url").unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string());
    let output = flag_value(args, "--output").unwrap_or_else(|| "prompts_export.json".to_string());

    let (explorer, _client) = load_explorer(&api_url).await?;
    let snapshot = explorer.snapshot();
    if snapshot.records.is_empty() {
        println!("No prompts to export.");
        return Ok(());
    }
    write_export(&snapshot, std::path::Path::new(&output))?;
    println!(
        "✅ Exported {} prompts to {}",
        snapshot.records.len(),
        output
    );
    Ok(())
}

async fn run_web(args: &[String]) -> anyhow::Result<()> {
    let upstream_url = flag_value(args, "--api-url");
    let port: u16 = match flag_value(args, "--port") {
        Some(value) => value
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid port {:?}", value))?,
        None => DEFAULT_SERVE_PORT,
    };

    let explorer = Arc::new(PromptExplorer::new());
    let client = Arc::new(CatalogClient::new()?);

    // Initial load is best-effort: the server still comes up with an empty
    // catalog and POST /api/refresh can fill it later.
    if let Some(url) = &upstream_url {
        if let Err(e) = explorer.refresh(&client, url).await {
            eprintln!("Warning: initial catalog fetch failed: {}", e);
        }
    }

    let mut server = ViewServer::start(explorer, client, upstream_url, port).await?;
    println!("🚀 Prompt Dash view server running on {}", server.base_url());
    println!("   GET  {}/api/prompts", server.base_url());
    println!("   GET  {}/api/prompts/stats", server.base_url());
    println!("   POST {}/api/refresh", server.base_url());
    println!("Press Ctrl+C to stop the server");

    tokio::signal::ctrl_c().await?;
    println!("\nShutting down server...");
    server.shutdown();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    setup_panic_handler();
    init_logging();

    let args: Vec<String> = std::env::args().collect();
    tracing::info!("promptdash starting, args: {:?}", args);

    let Some(command) = args.get(1).map(String::as_str) else {
        print_help();
        return Ok(());
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let command_args = &args[2..];

    match command {
        "list" => runtime.block_on(run_list(command_args)),
        "stats" => runtime.block_on(run_stats(command_args)),
        "export" => runtime.block_on(run_export(command_args)),
        "web" => runtime.block_on(run_web(command_args)),
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}\n", other);
            print_help();
            std::process::exit(2);
        }
    }
}
