use std::{
    collections::HashSet,
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    process::ExitCode,
    time::Duration,
};

use anyhow::Context;
use axum::Router;
use clap::{Parser, Subcommand};
use folio::{config::CONFIG_FILE, utils::create_new, Config, Site};
use notify::{RecursiveMode, Watcher};
use notify_debouncer_full::new_debouncer;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(about, version)]
struct Args {
    /// config file to read
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,
    /// command, `generate` when left out
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// generate the files to serve
    Generate,
    /// generate the site and serve it locally
    Serve {
        /// port to listen on, overrides the config
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// watch for updates and re-generate site on updates
    Watch,
    /// clean up the generated files
    Clean,
    /// create a minimal site in the current directory
    Init,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match args.command.unwrap_or(Commands::Generate) {
        Commands::Generate => {
            init_logger();
            match load(&args.config) {
                Ok(site) => generate(&site),
                Err(code) => code,
            }
        }
        Commands::Serve { port } => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| "folio=info,tower_http=debug".into()),
                )
                .with(tracing_subscriber::fmt::layer())
                .init();
            let site = match load(&args.config) {
                Ok(site) => site,
                Err(code) => return code,
            };
            generate(&site);
            let port = port.unwrap_or(site.config().serve.port);
            if let Err(err) = serve(using_serve_dir(&site.config().structure.output), port).await {
                log::error!("Encountered error `{err:?}`");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Commands::Watch => {
            init_logger();
            if let Err(err) = watch(&args.config) {
                log::error!("Encountered error `{err:?}`");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Commands::Clean => {
            init_logger();
            let config = match Config::load(&args.config) {
                Ok(config) => config,
                Err(err) => {
                    log::error!("Encountered error `{err}`");
                    return ExitCode::from(2);
                }
            };
            match fs::remove_dir_all(&config.structure.output) {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => ExitCode::SUCCESS,
                Err(err) => {
                    log::error!("Encountered error `{err}`");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Init => {
            init_logger();
            match create_new(".") {
                Ok(_) => ExitCode::SUCCESS,
                Err(err) => {
                    log::error!("Encountered error `{err}`");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// read the configuration and prepare the site, a failure here is a configuration error
fn load(config: &Path) -> Result<Site, ExitCode> {
    Config::load(config).and_then(Site::new).map_err(|err| {
        log::error!("Configuration error: `{err}`");
        ExitCode::from(2)
    })
}

fn generate(site: &Site) -> ExitCode {
    match site.run() {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(report) => {
            for failure in &report.failures {
                log::error!("  {}: {}", failure.path.display(), failure.error);
            }
            log::error!("{} files could not be generated", report.failures.len());
            ExitCode::FAILURE
        }
        Err(err) => {
            log::error!("Generation failed: `{err}`");
            ExitCode::FAILURE
        }
    }
}

fn watch(config_path: &Path) -> anyhow::Result<()> {
    // the config is read again on every change so edits to it and the templates are picked up
    let config = Config::load(config_path)?;
    if let Ok(site) = load(config_path) {
        generate(&site);
    }

    let (tx, rx) = std::sync::mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_secs(2), None, tx)?;
    for dir in [&config.structure.source, &config.structure.templates] {
        debouncer
            .watcher()
            .watch(dir, RecursiveMode::Recursive)
            .with_context(|| format!("watching `{}`", dir.display()))?;
    }
    if config_path.is_file() {
        debouncer
            .watcher()
            .watch(config_path, RecursiveMode::NonRecursive)?;
    }

    for res in rx {
        match res {
            Ok(events) => {
                let updated: HashSet<_> = events.into_iter().flat_map(|e| e.paths.clone()).collect();
                log::info!("Changes in: {updated:?}");
                log::info!("Regenerating");
                if let Ok(site) = load(config_path) {
                    generate(&site);
                }
            }
            Err(errors) => {
                for error in errors {
                    log::error!("Error received `{error:?}`");
                }
            }
        }
    }
    Ok(())
}

fn using_serve_dir(out_dir: &Path) -> Router {
    Router::new().fallback_service(ServeDir::new(out_dir))
}

async fn serve(app: Router, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app.layer(TraceLayer::new_for_http())).await?;
    Ok(())
}
