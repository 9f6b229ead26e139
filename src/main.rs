//! crewline - run weather-reporting and SEO-analysis crews
//!
//! Wires configuration, logging, the metrics backend, and the crew registry
//! together, then dispatches the parsed subcommand to the matching crew and
//! prints its report.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crewline::agents::build_agent_registry;
use crewline::cli::{Cli, Command};
use crewline::config::Settings;
use crewline::crew::{build_crew_registry, create_crew, CrewContext};
use crewline::error::CrewError;
use crewline::observability::select_sink;

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Prints the registered agents with their roles and tools.
fn list_agents() {
    let registry = build_agent_registry();
    let mut names: Vec<&str> = registry.keys().copied().collect();
    names.sort_unstable();

    println!("Registered agents:");
    for name in names {
        if let Some(ctor) = registry.get(name) {
            let agent = ctor();
            println!("  {} - {} (tools: {})", name, agent.role, agent.tools.join(", "));
        }
    }
}

/// Builds and runs the crew the command maps to, printing its report.
async fn run_crew(command: &Command, ctx: &CrewContext) -> Result<(), CrewError> {
    let name = match command.crew_name() {
        Some(name) => name,
        None => return Ok(()),
    };

    let registry = build_crew_registry();
    let crew = create_crew(&registry, name, ctx)?;
    let report = crew.run(&command.to_inputs()).await?;
    println!("{}", report);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.verbose {
        init_logging("debug");
    } else {
        init_logging(&settings.log_filter);
    }

    let sink = select_sink(&settings);
    let ctx = CrewContext {
        settings,
        sink: sink.clone(),
    };

    let result = match &cli.command {
        Command::Agents => {
            list_agents();
            Ok(())
        }
        command => run_crew(command, &ctx).await,
    };

    sink.flush();
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
