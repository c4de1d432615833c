/// Learning Progress MCP server binary
///
/// Parses the command line, configures stderr logging, resolves where progress is
/// stored, and serves the progress tools over stdin/stdout until the client hangs up.

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{info, warn};

use learning_progress_mcp::{Curriculum, LearningProgressServer, ServerConfig};

const DATA_DIR: &str = "learning_progress";
const DB_FILE: &str = "progress.db";

/// Command line arguments for the Learning Progress MCP server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// SQLite file holding learner progress (defaults to a per-user data directory)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Authenticated user id; progress is tracked for a guest when omitted
    #[arg(long)]
    user: Option<String>,

    /// JSON file with the roadmap entries and units to serve instead of the built-in one
    #[arg(long)]
    curriculum: Option<PathBuf>,

    /// IANA timezone used to pick the consent region (defaults to $TZ)
    #[arg(long)]
    timezone: Option<String>,

    /// Log at info level
    #[arg(short, long)]
    debug: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

/// Create `dir` and check a file can actually be written there
fn is_writable(dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }
    let marker = dir.join(".write_check");
    let ok = std::fs::write(&marker, b"").is_ok();
    if ok {
        let _ = std::fs::remove_file(&marker);
    }
    ok
}

/// First writable candidate among home, data, config and working directories
fn default_database_path() -> std::io::Result<PathBuf> {
    let candidates = [
        dirs::home_dir().map(|home| home.join(format!(".{}", DATA_DIR))),
        dirs::data_dir().map(|data| data.join(DATA_DIR)),
        dirs::config_dir().map(|config| config.join(DATA_DIR)),
        std::env::current_dir().ok().map(|cwd| cwd.join(format!(".{}", DATA_DIR))),
    ];

    if let Some(dir) = candidates.iter().flatten().find(|dir| is_writable(dir)) {
        return Ok(dir.join(DB_FILE));
    }

    let dir = std::env::temp_dir().join(DATA_DIR);
    std::fs::create_dir_all(&dir)?;
    warn!("No writable data directory, keeping progress in {}", dir.display());
    Ok(dir.join(DB_FILE))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = match (args.verbose, args.debug) {
        (true, _) => "debug",
        (false, true) => "info",
        _ => "warn",
    };

    // stdout carries JSON-RPC
    tracing_subscriber::fmt()
        .with_env_filter(format!("learning_progress_mcp={}", level))
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Learning Progress MCP server");

    let db_path = match args.database {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            path
        }
        None => default_database_path()?,
    };
    info!("Using database at: {}", db_path.display());

    let curriculum = match args.curriculum {
        Some(path) => {
            info!("Loading curriculum from: {}", path.display());
            Curriculum::from_json_file(&path)?
        }
        None => Curriculum::default(),
    };

    let config = ServerConfig {
        user_id: args.user,
        curriculum,
        timezone: args.timezone.or_else(|| std::env::var("TZ").ok()),
    };

    let server = LearningProgressServer::new(db_path, config).await?;
    server.run().await?;

    info!("Learning Progress MCP server stopped");
    Ok(())
}
