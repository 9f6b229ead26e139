//! Command-line interface parsing for crewline
//!
//! This module defines the clap command tree and the translation from parsed
//! arguments into crew names and [`CrewInputs`]. Sort-column validation
//! happens here so bad values fail at parse time with a helpful message.

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::crew::CrewInputs;
use crate::tools::SortBy;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified sort column is not recognized
    #[error("Invalid sort column: '{0}'. Valid columns: clicks, impressions, ctr, position")]
    InvalidSortBy(String),
}

/// crewline - run weather and SEO crews from the command line
#[derive(Parser, Debug)]
#[command(name = "crewline")]
#[command(about = "Run weather-reporting and SEO-analysis crews")]
#[command(version)]
pub struct Cli {
    /// Enable verbose (debug-level) logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report the current weather for a location
    Weather {
        /// City or location to report on (e.g. "London", "Tokyo")
        #[arg(long, short)]
        location: String,
    },

    /// Analyze Search Console keywords and verify search visibility
    Seo {
        /// Domain to analyze (e.g. "example.com")
        #[arg(long, short)]
        domain: String,

        /// Company name checked alongside the domain in search results
        #[arg(long, short)]
        company_name: String,

        /// Number of top keywords to fetch
        #[arg(long, short = 'n', default_value_t = 10)]
        num_keywords: u32,

        /// Days to look back in Search Console
        #[arg(long, short = 'r', default_value_t = 30)]
        date_range: u32,

        /// Sort column: clicks, impressions, ctr, or position
        #[arg(long, short, default_value = "clicks", value_parser = parse_sort_by)]
        sort_by: SortBy,
    },

    /// List the registered agents
    Agents,
}

impl Command {
    /// The crew registry name this command maps to, if any.
    pub fn crew_name(&self) -> Option<&'static str> {
        match self {
            Command::Weather { .. } => Some("weather"),
            Command::Seo { .. } => Some("seo"),
            Command::Agents => None,
        }
    }

    /// Translates the parsed arguments into crew inputs.
    pub fn to_inputs(&self) -> CrewInputs {
        match self {
            Command::Weather { location } => CrewInputs {
                location: Some(location.clone()),
                ..CrewInputs::default()
            },
            Command::Seo {
                domain,
                company_name,
                num_keywords,
                date_range,
                sort_by,
            } => CrewInputs {
                domain: Some(domain.clone()),
                company_name: Some(company_name.clone()),
                num_keywords: *num_keywords,
                date_range_days: *date_range,
                sort_by: *sort_by,
                ..CrewInputs::default()
            },
            Command::Agents => CrewInputs::default(),
        }
    }
}

/// Parses a sort-column argument into a [`SortBy`].
pub fn parse_sort_by(s: &str) -> Result<SortBy, CliError> {
    s.parse::<SortBy>().map_err(CliError::InvalidSortBy)
}
