// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! YAICT: Yet Another Image Captioning Tool
//!
//! Command line front end for ingesting, listing and captioning images.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use yaict::config::AppConfig;
use yaict::dataset::DatasetManager;
use yaict::{Result, YaictError};

/// YAICT CLI - local image dataset and captioning tool
#[derive(Parser, Debug)]
#[command(name = "yaict")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version = "0.1.0")]
#[command(about = "Manage a local image captioning dataset", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Dataset root directory (overrides config)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a single image to the dataset
    Add {
        /// Image file to add
        path: PathBuf,

        /// Also copy a sibling caption file (<stem>.txt or <stem>.caption)
        #[arg(long)]
        captions: bool,
    },

    /// Add every image in a folder
    Import {
        /// Folder to import from
        folder: PathBuf,

        /// Extensions to import (overrides config), e.g. --ext .jpg --ext .png
        #[arg(short, long)]
        ext: Vec<String>,

        /// Also copy sibling caption files
        #[arg(long)]
        captions: bool,
    },

    /// List all image ids
    List,

    /// Show paths and caption for one image
    Show {
        /// Image id
        id: String,
    },

    /// Set or copy the caption of an image
    Caption {
        /// Image id
        id: String,

        /// Caption text
        #[arg(conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,

        /// Copy an existing caption file instead
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Initialize a new dataset with a default configuration
    Init {
        /// Directory to initialize (default: current)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Force overwrite existing configuration
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = AppConfig::load(&cli.config)?;
    if let Some(root) = &cli.root {
        config.dataset.root = root.to_string_lossy().to_string();
    }

    match cli.command {
        Commands::Add { path, captions } => run_add(&config, &path, captions),
        Commands::Import { folder, ext, captions } => {
            run_import(&config, &folder, ext, captions || config.dataset.include_captions)
        }
        Commands::List => run_list(&config, &cli.format),
        Commands::Show { id } => run_show(&config, &id, &cli.format),
        Commands::Caption { id, text, file } => run_caption(&config, &id, text, file),
        Commands::Config { action } => run_config_command(&config, action),
        Commands::Init { dir, force } => run_init(dir, force),
    }
}

fn open_dataset(config: &AppConfig) -> Result<DatasetManager> {
    let root = config.dataset.root_path();
    debug!("Opening dataset at {:?}", root);
    DatasetManager::open(root)
}

fn run_add(config: &AppConfig, path: &Path, captions: bool) -> Result<()> {
    let mut dataset = open_dataset(config)?;
    let id = dataset.add_image(path, captions)?;
    println!("{}", id);
    Ok(())
}

fn run_import(config: &AppConfig, folder: &Path, ext: Vec<String>, captions: bool) -> Result<()> {
    let extensions = if ext.is_empty() {
        config.dataset.image_extensions.clone()
    } else {
        ext
    };
    info!("Using file extensions: {:?}", extensions);

    let mut dataset = open_dataset(config)?;
    let ids = dataset.add_images_from_folder(folder, extensions.as_slice(), captions)?;
    for id in &ids {
        println!("{}", id);
    }
    info!("Imported {} images from {:?}", ids.len(), folder);
    Ok(())
}

fn run_list(config: &AppConfig, format: &str) -> Result<()> {
    let dataset = open_dataset(config)?;

    match format {
        "json" => {
            let records: Vec<_> = dataset.records().collect();
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        _ => {
            for record in dataset.records() {
                let caption = if record.has_caption() { "captioned" } else { "-" };
                println!("{}  {}  {}", record.id, record.group, caption);
            }
            println!("\n{} images", dataset.len());
        }
    }

    Ok(())
}

fn run_show(config: &AppConfig, id: &str, format: &str) -> Result<()> {
    let dataset = open_dataset(config)?;
    let record = dataset
        .info_by_id(id)
        .ok_or_else(|| YaictError::NotFound(format!("Image {} not found", id)))?;
    let caption = dataset.caption(id)?;

    match format {
        "json" => {
            let output = serde_json::json!({
                "record": record,
                "image_path": dataset.image_path(id),
                "caption_path": dataset.caption_path(id),
                "thumbnail_path": dataset.thumbnail_path(id),
                "caption": caption,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        _ => {
            println!("Image {}", record.id);
            println!("  Group:     {}", record.group);
            println!("  Folder:    {}", display(dataset.containing_folder(id)));
            println!("  Image:     {}", display(dataset.image_path(id)));
            println!("  Thumbnail: {}", display(dataset.thumbnail_path(id)));
            println!("  Caption:   {}", display(dataset.caption_path(id)));
            if let Some(text) = caption {
                println!("\n{}", text);
            }
        }
    }

    Ok(())
}

fn display(path: Option<PathBuf>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn run_caption(config: &AppConfig, id: &str, text: Option<String>, file: Option<PathBuf>) -> Result<()> {
    let mut dataset = open_dataset(config)?;

    match (text, file) {
        (_, Some(file)) => dataset.copy_caption_file(id, &file)?,
        (Some(text), None) => dataset.set_caption(id, &text)?,
        (None, None) => {
            return Err(YaictError::InvalidState("Either caption text or --file is required".to_string()))
        }
    }

    println!("Caption updated for {}", id);
    Ok(())
}

/// Run config commands
fn run_config_command(config: &AppConfig, action: ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
    }

    Ok(())
}

/// Initialize a new dataset directory
fn run_init(dir: Option<PathBuf>, force: bool) -> Result<()> {
    let target = dir.unwrap_or_else(|| PathBuf::from("."));
    let config_path = target.join("config.json");

    if config_path.exists() && !force {
        return Err(YaictError::Config(
            "config.json already exists. Use --force to overwrite".to_string()
        ));
    }

    let mut config = AppConfig::default();
    let root = target.join("yaict_data");
    config.dataset.root = root.to_string_lossy().to_string();

    std::fs::create_dir_all(&target)?;
    DatasetManager::open(&root)?;
    config.save(&config_path)?;

    println!("YAICT initialized in {:?}", target);
    println!("\nCreated:");
    println!("  - config.json");
    println!("  - yaict_data/images/");
    println!("  - yaict_data/thumbnails/");
    println!("\nNext steps:");
    println!("  1. Import images: yaict import <folder> --captions");
    println!("  2. Browse them:   yaict-web --open");

    Ok(())
}
