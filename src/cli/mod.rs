//! CLI interface for mizan.
//!
//! Provides command-line argument parsing using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command-line interface for mizan.
#[derive(Parser)]
#[command(name = "mizan")]
#[command(author, version, about = "Fuzzy search over Quran, Hadith and podcast collections", long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default location.
    #[arg(long, global = true, env = "MIZAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the `<category>.json` collection files.
    #[arg(long, global = true, env = "MIZAN_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Search every category (or one) for a query.
    Search {
        /// The search query string. An empty string lists the first page.
        query: String,

        /// Search this category only.
        #[arg(short, long)]
        category: Option<String>,

        /// Page size, overriding each category's configured limit.
        #[arg(short, long)]
        limit: Option<usize>,

        /// Number of ranked results to skip.
        #[arg(short, long, default_value_t = 0)]
        offset: usize,

        /// Minimum score for a result to be kept.
        #[arg(long)]
        min_score: Option<f64>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List configured categories and their collection files.
    Categories,

    /// Read queries from stdin, one per line, and print debounced results.
    Watch {
        /// Print results as JSON, one object per line.
        #[arg(long)]
        json: bool,
    },

    /// Start the MCP server for AI editor integration.
    #[cfg(feature = "mcp")]
    Serve,
}
