use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::{debug, info};
use std::io::Read;
use std::path::Path;

use pagetext::cli::{Cli, Command};
use pagetext::{ContentNode, DEFAULT_MAX_LENGTH};

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
    Ok(())
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
        }
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    info!("pagetext starting");

    match cli.command {
        Command::Chunk { file, max_length, json } => {
            let text = read_input(file.as_deref())?;
            let max_length = max_length.unwrap_or(DEFAULT_MAX_LENGTH);
            let chunks = pagetext::chunk(&text, max_length)?;
            debug!("produced {} chunks", chunks.len());

            if json {
                println!("{}", serde_json::to_string_pretty(&chunks)?);
            } else {
                for (i, chunk) in chunks.iter().enumerate() {
                    println!(
                        "{} {}",
                        format!("[{}]", i + 1).cyan(),
                        format!("({} chars)", chunk.chars().count()).dimmed()
                    );
                    println!("{}", chunk);
                }
            }
        }
        Command::Extract { file } => {
            let input = read_input(file.as_deref())?;
            let value: serde_json::Value = serde_json::from_str(&input).context("Input is not valid JSON")?;
            let nodes = pagetext::parse_blocks(&value);
            debug!("parsed {} nodes", nodes.len());
            print!("{}", pagetext::extract(&nodes));
        }
        Command::Paragraphs {
            file,
            max_length,
            header,
        } => {
            let text = read_input(file.as_deref())?;
            let chunks = pagetext::chunk(&text, max_length.unwrap_or(DEFAULT_MAX_LENGTH))?;
            let nodes = match header {
                Some(h) => pagetext::with_header(ContentNode::heading_2(h), &chunks),
                None => pagetext::to_paragraphs(&chunks),
            };
            let blocks: Vec<serde_json::Value> = nodes.iter().map(ContentNode::to_block).collect();
            println!("{}", serde_json::to_string_pretty(&blocks)?);
        }
    }

    Ok(())
}
