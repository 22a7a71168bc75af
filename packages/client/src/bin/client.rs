//! geolive CLI client.
//!
//! Watches a live feed of the backend, or opens an interactive boundary
//! drawing prompt on a console map canvas.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin geolive-client -- --token secret watch alerts
//! cargo run --bin geolive-client -- watch iot --sensor pm25 --capacity 50
//! cargo run --bin geolive-client -- draw --zoom 14
//! ```

use clap::{Parser, Subcommand};

use geolive_client::{
    draw::run_draw,
    error::ClientError,
    watch::{WatchTarget, run_watch},
};
use geolive_shared::{
    logger::setup_logger,
    session::{DEFAULT_API_BASE, Session, SessionContext},
};

#[derive(Parser, Debug)]
#[command(name = "geolive-client")]
#[command(about = "Live map feeds and boundary drawing from the terminal", long_about = None)]
struct Args {
    /// REST API base URL (the WebSocket base is derived from it)
    #[arg(short = 'u', long, default_value = DEFAULT_API_BASE)]
    api_url: String,

    /// Bearer token for the backend
    #[arg(short = 't', long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Follow one live feed
    Watch {
        #[arg(value_enum)]
        target: WatchTarget,

        /// Scope the IoT feed to one sensor
        #[arg(short, long)]
        sensor: Option<String>,

        /// Maximum number of retained items
        #[arg(short, long)]
        capacity: Option<usize>,
    },
    /// Draw a boundary on a console map
    Draw {
        /// Initial map zoom level
        #[arg(short, long, default_value_t = 12.0)]
        zoom: f64,
    },
}

async fn run(args: Args) -> Result<(), ClientError> {
    match args.command {
        Command::Watch {
            target,
            sensor,
            capacity,
        } => {
            let session = SessionContext::begin(Session::new(&args.api_url, args.token)?);
            let result = run_watch(&session, target, sensor, capacity).await;
            SessionContext::end();
            result
        }
        Command::Draw { zoom } => run_draw(zoom).await,
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
