use clap::Parser;
use site_profiler::AppConfig;

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match AppConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                ::log::error!("Failed to load config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => AppConfig::default(),
    };
    let mut config = config.with_env();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    if config.crawler.render.enabled {
        ::log::info!(
            "Render fallback uses the WebDriver server at {} (set WEBDRIVER_URL to change it)",
            config.crawler.render.webdriver_url
        );
    }

    if let Err(e) = site_profiler::server::serve(config).await {
        ::log::error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}
