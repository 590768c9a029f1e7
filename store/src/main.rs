//! Development query-result store CLI.
//!
//! Reads page and static query results from `.query-store/results/` and
//! renders page views the way a live page cache would.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use query_result_store::core::types::PageView;
use query_result_store::exit_codes;
use query_result_store::io::config::{StoreConfig, load_config};
use query_result_store::io::init::{InitOptions, StorePaths, init_store};
use query_result_store::logging;
use query_result_store::render::{
    RenderRequest, list_paths, parse_object, parse_prop, render_from_root,
};
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "query-store",
    version,
    about = "Development-time query result store"
)]
struct Cli {
    /// Config file (defaults to `.query-store/config.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.query-store/` with a default config and empty results directory.
    Init {
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
    /// Render the page view for a path and print its props as JSON.
    Render {
        /// Page path, e.g. `/blog/hello/`.
        path: String,
        /// Declared route template, e.g. `/users/:id`.
        #[arg(long)]
        route: Option<String>,
        /// Own prop as `key=value`; the value is parsed as JSON when possible.
        #[arg(long = "prop", value_name = "KEY=VALUE")]
        props: Vec<String>,
        /// Page context as a JSON object (may carry `__params`, `__collectionData`).
        #[arg(long)]
        context: Option<String>,
    },
    /// List normalized paths that have a result.
    Paths,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let root = std::env::current_dir().context("resolve current directory")?;
    match cli.command {
        Command::Init { force } => cmd_init(&root, force),
        Command::Render {
            path,
            route,
            props,
            context,
        } => {
            let config = load(&root, cli.config.as_deref())?;
            let mut request = RenderRequest {
                path,
                route,
                ..RenderRequest::default()
            };
            for raw in &props {
                let (key, value) = parse_prop(raw)?;
                request.props.insert(key, value);
            }
            if let Some(raw) = context {
                request.page_context = parse_object(&raw).context("--context")?;
            }
            cmd_render(&root, &config, &request)
        }
        Command::Paths => {
            let config = load(&root, cli.config.as_deref())?;
            cmd_paths(&root, &config)
        }
    }
}

fn load(root: &Path, explicit: Option<&Path>) -> Result<StoreConfig> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| StorePaths::new(root).config_path);
    debug!(path = %path.display(), "loading config");
    load_config(&path)?.with_env_overrides()
}

fn cmd_init(root: &Path, force: bool) -> Result<i32> {
    let paths = init_store(root, &InitOptions { force })?;
    println!("{}", paths.store_dir.display());
    Ok(exit_codes::OK)
}

fn cmd_render(root: &Path, config: &StoreConfig, request: &RenderRequest) -> Result<i32> {
    match render_from_root(root, config, request)? {
        PageView::Placeholder => {
            println!("null");
            Ok(exit_codes::PLACEHOLDER)
        }
        PageView::Page(props) => {
            let json = serde_json::to_string_pretty(&props).context("serialize props")?;
            println!("{json}");
            Ok(exit_codes::OK)
        }
    }
}

fn cmd_paths(root: &Path, config: &StoreConfig) -> Result<i32> {
    for path in list_paths(root, config)? {
        println!("{path}");
    }
    Ok(exit_codes::OK)
}
