use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use pdflocate::ExtractOptions;

/// Locate PDF compliance violations on the page and inspect structure trees.
#[derive(Debug, Parser)]
#[command(name = "pdflocate", about, version)]
pub struct Cli {
    /// Log debug diagnostics to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve each violation of a scan report to a page
    Locate {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Scan summary JSON (a single result or a whole scan job)
        #[arg(long, value_name = "JSON")]
        report: PathBuf,

        /// Pick the report entry with this file name. Default: the PDF's name
        #[arg(long)]
        file_name: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Print the structure tree, or the outline when the PDF is untagged
    Tags {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Compute the highlight and label layout for one page
    Plan {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Scan summary JSON (a single result or a whole scan job)
        #[arg(long, value_name = "JSON")]
        report: PathBuf,

        /// Page number (1-based)
        #[arg(long)]
        page: usize,

        /// Index of the violation to emphasize (0-based, report order)
        #[arg(long)]
        focus: Option<usize>,

        /// Pick the report entry with this file name. Default: the PDF's name
        #[arg(long)]
        file_name: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Write a copy of the PDF with every violation drawn on its page
    Annotate {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Scan summary JSON (a single result or a whole scan job)
        #[arg(long, value_name = "JSON")]
        report: PathBuf,

        /// Where to write the copy. Default: <stem>_annotated.pdf next to FILE
        #[arg(short, long, value_name = "PDF")]
        output: Option<PathBuf>,

        /// Index of the violation to emphasize (0-based, report order)
        #[arg(long)]
        focus: Option<usize>,

        /// Pick the report entry with this file name. Default: the PDF's name
        #[arg(long)]
        file_name: Option<String>,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Locate violations for every file of a saved scan job
    Batch {
        /// Scan job JSON
        #[arg(value_name = "JSON")]
        report: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        #[command(flatten)]
        extract: ExtractArgs,
    },
}

/// Extraction bounds shared by all subcommands.
#[derive(Debug, Clone, Args)]
pub struct ExtractArgs {
    /// Maximum structure tree depth
    #[arg(long, default_value_t = 64)]
    pub max_struct_depth: usize,

    /// Maximum Form XObject nesting while scanning page content
    #[arg(long, default_value_t = 10)]
    pub max_content_depth: usize,

    /// Maximum text-search hits per violation context
    #[arg(long, default_value_t = 5)]
    pub max_search_hits: usize,
}

impl ExtractArgs {
    pub fn to_options(&self) -> ExtractOptions {
        ExtractOptions {
            max_struct_depth: self.max_struct_depth,
            max_content_depth: self.max_content_depth,
            max_search_hits: self.max_search_hits,
            ..ExtractOptions::default()
        }
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tab-separated text
    Text,
    /// JSON
    Json,
}
