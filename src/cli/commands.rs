use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::IniConfig;
use crate::context::Context;
use crate::engine::Engine;
use crate::logging::{init_logging, LogConfig};
use crate::middleware::Recovery;
use crate::runtime_config::RuntimeConfig;
use crate::server::{AppService, HttpServer, ServerHandle};
use crate::templates::{ResponsePayload, Templates};

/// Command-line interface for xia
#[derive(Parser)]
#[command(name = "xia")]
#[command(about = "xia router demo server", long_about = None, version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the demo application
    Serve {
        /// INI file with [project] and [server] sections
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Address to bind, overriding config and XIA_ADDR
        #[arg(long)]
        addr: Option<String>,

        /// Directory served under /assets
        #[arg(long = "static")]
        static_dir: Option<PathBuf>,

        /// Template directory for /page/:name
        #[arg(long)]
        templates: Option<PathBuf>,
    },
    /// Print the demo application's routes
    Routes {
        /// INI file whose [server] static/templates enable optional routes
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Optional pieces of the demo application.
#[derive(Debug, Clone, Default)]
pub struct DemoOptions {
    pub static_dir: Option<PathBuf>,
    pub templates: Option<PathBuf>,
}

impl DemoOptions {
    /// Directories from the `static` and `templates` keys of `[server]`.
    #[must_use]
    pub fn from_config(cfg: &IniConfig) -> Self {
        Self {
            static_dir: cfg.get("server", "static").map(PathBuf::from),
            templates: cfg.get("server", "templates").map(PathBuf::from),
        }
    }

    /// Command-line values win over configured ones.
    #[must_use]
    pub fn with_overrides(mut self, static_dir: Option<&PathBuf>, templates: Option<&PathBuf>) -> Self {
        if let Some(dir) = static_dir {
            self.static_dir = Some(dir.clone());
        }
        if let Some(dir) = templates {
            self.templates = Some(dir.clone());
        }
        self
    }
}

/// Build the demo application.
///
/// Routes:
/// - `GET /xia`: HTML greeting
/// - `POST /xia`: echoes the `username` form field
/// - `GET /hello/:name`: JSON greeting
/// - `GET /api/test/group`: group route behind the `/` logger
/// - `GET /api/boom`: panics, answered 500 by the recovery middleware
/// - `GET /assets/*filepath`: static files, with `--static`
/// - `GET /page/:name`: renders `<name>.html`, with `--templates`
#[must_use]
pub fn demo_engine(opts: &DemoOptions) -> Engine {
    let mut engine = Engine::classic();
    engine.use_middleware(Recovery);

    engine.get("/xia", |c: &mut Context| {
        c.html(200, "<html><head></head><body><h2>xia</h2></body></html>");
    });
    engine.post("/xia", |c: &mut Context| {
        let name = c.post_form("username").to_string();
        c.string(200, name);
    });
    engine.get("/hello/:name", |c: &mut Context| {
        let body = json!({ "hello": c.param("name") });
        c.json(200, &body);
    });

    {
        let mut api = engine.group("/api");
        api.get("test/group", |c: &mut Context| {
            c.html(200, "<html><head></head><body><h2>Group test</h2></body></html>");
        });
        api.get("boom", |c: &mut Context| {
            let empty: Vec<u8> = Vec::new();
            // Out of bounds; the recovery middleware answers 500.
            let byte = empty[1];
            c.string(200, byte.to_string());
        });
    }

    if let Some(dir) = &opts.static_dir {
        engine.static_files("/assets", &dir.to_string_lossy());
    }

    if let Some(dir) = &opts.templates {
        let templates = Arc::new(Templates::new(dir.to_string_lossy()).with_cache(true));
        engine.get("/page/:name", move |c: &mut Context| {
            let file = format!("{}.html", c.param("name"));
            let payload = ResponsePayload::new(json!({ "name": c.param("name"), "path": c.path() }), 200, "ok");
            c.write_template(&templates, &file, &payload);
        });
    }

    engine
}

pub(crate) fn load_config(path: Option<&PathBuf>) -> Result<IniConfig> {
    match path {
        Some(p) => IniConfig::load(p).with_context(|| format!("Failed to load {}", p.display())),
        None => Ok(IniConfig::default()),
    }
}

/// Execute a parsed command.
///
/// # Errors
///
/// Config, logging or bind failures.
pub fn run_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Serve {
            config,
            addr,
            static_dir,
            templates,
        } => {
            let cfg = load_config(config.as_ref())?;
            let _log = init_logging(&LogConfig::from_config(&cfg))?;

            let mut runtime = RuntimeConfig::from_config(&cfg);
            if let Some(addr) = addr {
                runtime.addr = addr.clone();
            }
            runtime.apply();

            let opts = DemoOptions::from_config(&cfg).with_overrides(static_dir.as_ref(), templates.as_ref());
            let engine = demo_engine(&opts);
            let service = AppService::new(Arc::new(engine)).with_health(true);
            let handle = HttpServer(service)
                .start(runtime.addr.as_str())
                .with_context(|| format!("Failed to bind {}", runtime.addr))?;
            info!(addr = %handle.addr(), "xia serving");
            wait_for_shutdown(handle)
        }
        Commands::Routes { config } => {
            let cfg = load_config(config.as_ref())?;
            let engine = demo_engine(&DemoOptions::from_config(&cfg));
            for (method, pattern) in engine.routes() {
                println!("{method:<7} {pattern}");
            }
            Ok(())
        }
    }
}

#[cfg(unix)]
fn wait_for_shutdown(handle: ServerHandle) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("Failed to install signal handlers")?;
    if let Some(sig) = signals.forever().next() {
        info!(signal = sig, "Shutdown signal received");
    }
    handle.stop();
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown(handle: ServerHandle) -> Result<()> {
    handle
        .join()
        .map_err(|e| anyhow::anyhow!("server exited abnormally: {e:?}"))
}

/// Parse the command line and run it.
///
/// # Errors
///
/// See [`run_command`].
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_command(&cli)
}
