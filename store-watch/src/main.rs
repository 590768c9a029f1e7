//! Query store watcher - keeps page caches mounted and prints every re-render.

mod session;
mod watch;

use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use query_result_store::io::config::load_config;
use query_result_store::io::init::StorePaths;
use tracing::info;

use crate::session::{LineSink, Session};

#[derive(Parser)]
#[command(name = "query-store-watch")]
#[command(about = "Watch query results and print page views as they change")]
struct Args {
    /// Project directory (contains .query-store/)
    #[arg(long, default_value = ".")]
    project_dir: PathBuf,

    /// Config file (defaults to .query-store/config.toml in the project directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Page paths to keep mounted
    paths: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("query_store_watch=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let project_dir = args.project_dir.canonicalize().unwrap_or(args.project_dir);
    info!(project_dir = %project_dir.display(), "starting query-store-watch");

    let config_path = args
        .config
        .unwrap_or_else(|| StorePaths::new(&project_dir).config_path);
    let config = load_config(&config_path)?.with_env_overrides()?;

    let sink: LineSink = Rc::new(|line| println!("{line}"));
    let session = Session::open(&project_dir, &config, &args.paths, sink)?;

    watch::run(&session, &config.watch).await
}
