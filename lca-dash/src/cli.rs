//! Command-line definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use lca_dash::models::ConfidenceLevel;
use lca_dash::services::ReviewFilter;

/// Command-line arguments for lca-dash
#[derive(Parser, Debug)]
#[command(name = "lca-dash")]
#[command(about = "Terminal dashboard for the LCA product backend")]
#[command(version)]
pub struct Args {
    /// Config file (default: platform config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend API base URL
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Folder holding session and upload history
    #[arg(long, global = true, value_name = "DIR")]
    pub data_folder: Option<PathBuf>,

    /// Log filter (e.g. "debug", "lca_dash=trace")
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and store the session
    Login {
        email: String,
        /// Read from stdin when omitted
        #[arg(long, env = "LCA_DASH_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// End the session
    Logout,
    /// Show the current user
    Whoami,
    /// Act as another user (admins only)
    Impersonate { user_id: String },
    /// Return to the admin account
    StopImpersonating,
    /// Upload a product CSV and track processing
    Upload {
        file: PathBuf,
        /// Return once the job is queued
        #[arg(long)]
        no_wait: bool,
    },
    /// Resume tracking a queued job
    Track { job_id: String },
    /// Recent finished uploads
    History {
        /// Forget all entries
        #[arg(long)]
        clear: bool,
    },
    /// Materials from a finished upload that need a mapping
    Review {
        job_id: String,
        #[arg(long, default_value = "all", value_parser = parse_filter)]
        filter: ReviewFilter,
        /// Case-insensitive name search
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Search ecoinvent activities for a material name
    Alternatives { material_name: String },
    /// Confirm mappings for a finished upload
    Confirm {
        job_id: String,
        /// Auto-select each material's top suggestion at or above this level
        #[arg(long, value_enum, default_value_t = Level::High)]
        min_level: Level,
        /// Explicit choice as MATERIAL_ID:SUGGESTION_INDEX (repeatable)
        #[arg(long = "pick", value_name = "ID:INDEX", value_parser = parse_pick)]
        picks: Vec<(String, usize)>,
        /// Alternative activity as MATERIAL_ID:ACTIVITY_UUID (repeatable);
        /// searched by the material's name
        #[arg(long = "alt", value_name = "ID:UUID", value_parser = parse_alt)]
        alternatives: Vec<(String, String)>,
    },
    /// Product catalogue
    Products {
        #[command(subcommand)]
        action: ProductsCommand,
    },
    /// Download the CSV upload template
    Template { dest: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum ProductsCommand {
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long)]
        search: Option<String>,
    },
    Show { id: String },
    Delete { id: String },
    /// Impact totals and per-material breakdown
    Impacts {
        id: String,
        /// Width of the contribution bars
        #[arg(long, default_value_t = 20)]
        bar_width: usize,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Level {
    High,
    Medium,
    Low,
}

impl From<Level> for ConfidenceLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::High => ConfidenceLevel::High,
            Level::Medium => ConfidenceLevel::Medium,
            Level::Low => ConfidenceLevel::Low,
        }
    }
}

fn parse_filter(raw: &str) -> Result<ReviewFilter, String> {
    raw.parse()
}

fn parse_pick(raw: &str) -> Result<(String, usize), String> {
    let (id, index) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("expected MATERIAL_ID:INDEX, got '{}'", raw))?;
    let index = index
        .parse::<usize>()
        .map_err(|_| format!("'{}' is not a suggestion index", index))?;
    Ok((id.to_string(), index))
}

fn parse_alt(raw: &str) -> Result<(String, String), String> {
    match raw.split_once(':') {
        Some((id, uuid)) if !id.is_empty() && !uuid.is_empty() => {
            Ok((id.to_string(), uuid.to_string()))
        }
        _ => Err(format!("expected MATERIAL_ID:ACTIVITY_UUID, got '{}'", raw)),
    }
}
