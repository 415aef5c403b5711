use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "marquee-server")]
#[command(about = "Movie browsing backend with guest-session favorites", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "marquee-server.yaml")]
    config: String,
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let mut config = match marquee_rs::config::Config::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    config.debug_logs = args.debug;

    let default_filter = if args.debug {
        "marquee_rs=debug,tower_http=debug"
    } else {
        "marquee_rs=info,tower_http=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    if config.json_logs() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!("Using config file: {}", args.config);

    if let Err(e) = marquee_rs::run(config).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
