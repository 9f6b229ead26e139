//! Integration tests for CLI argument handling
//!
//! Tests subcommand parsing and the offline `agents` command against the
//! built binary; crews that call external services are covered by unit tests.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_crewline"))
        .args(args)
        .output()
        .expect("Failed to execute crewline")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("crewline"), "Help should mention crewline");
    assert!(stdout.contains("weather"), "Help should list the weather subcommand");
    assert!(stdout.contains("seo"), "Help should list the seo subcommand");
}

#[test]
fn test_weather_without_location_fails() {
    let output = run_cli(&["weather"]);
    assert!(
        !output.status.success(),
        "Expected missing --location to fail"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("location"),
        "Should complain about the missing location: {}",
        stderr
    );
}

#[test]
fn test_seo_with_invalid_sort_column_fails() {
    let output = run_cli(&[
        "seo",
        "--domain",
        "example.com",
        "--company-name",
        "Acme",
        "--sort-by",
        "pageviews",
    ]);
    assert!(!output.status.success(), "Expected invalid sort column to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid sort column") || stderr.contains("invalid"),
        "Should print error about the sort column: {}",
        stderr
    );
}

#[test]
fn test_unknown_subcommand_fails() {
    let output = run_cli(&["finance"]);
    assert!(!output.status.success(), "Expected unknown subcommand to fail");
}

#[test]
fn test_agents_command_lists_registered_agents() {
    let output = run_cli(&["agents"]);
    assert!(
        output.status.success(),
        "Expected agents command to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("weather"), "Should list the weather agent");
    assert!(stdout.contains("seo"), "Should list the seo agent");
    assert!(
        stdout.contains("Weather Reporter"),
        "Should show the weather agent's role"
    );
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use crewline::cli::{Cli, Command};
    use crewline::tools::SortBy;

    #[test]
    fn test_cli_weather_subcommand_parses() {
        let cli = Cli::parse_from(["crewline", "weather", "-l", "Tokyo"]);
        match &cli.command {
            Command::Weather { location } => assert_eq!(location, "Tokyo"),
            other => panic!("expected weather command, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_seo_subcommand_parses_with_defaults() {
        let cli = Cli::parse_from([
            "crewline",
            "seo",
            "--domain",
            "example.com",
            "--company-name",
            "Acme",
        ]);
        match &cli.command {
            Command::Seo {
                domain,
                company_name,
                num_keywords,
                date_range,
                sort_by,
            } => {
                assert_eq!(domain, "example.com");
                assert_eq!(company_name, "Acme");
                assert_eq!(*num_keywords, 10);
                assert_eq!(*date_range, 30);
                assert_eq!(*sort_by, SortBy::Clicks);
            }
            other => panic!("expected seo command, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_requires_a_subcommand() {
        assert!(Cli::try_parse_from(["crewline"]).is_err());
    }
}
