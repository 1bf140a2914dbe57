//! CLI argument parsing for pagetext

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pt")]
#[command(author, version, about = "Flatten content blocks to text and chunk text into blocks", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Split text into sentence-aware chunks
    Chunk {
        /// Input file (reads stdin when omitted)
        file: Option<PathBuf>,

        /// Maximum characters per chunk (default: 1800)
        #[arg(short, long)]
        max_length: Option<usize>,

        /// Print chunks as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Flatten block JSON into plain text
    Extract {
        /// Block JSON file, either an array or a list response (reads stdin when omitted)
        file: Option<PathBuf>,
    },

    /// Chunk text and print append-ready paragraph blocks
    Paragraphs {
        /// Input file (reads stdin when omitted)
        file: Option<PathBuf>,

        /// Maximum characters per chunk (default: 1800)
        #[arg(short, long)]
        max_length: Option<usize>,

        /// Heading text placed before the paragraphs
        #[arg(long)]
        header: Option<String>,
    },
}
