//! flowscope - Terminal dashboard for marketing flows and their subject lines

use clap::Parser;
use dotenvy::dotenv;

use flowscope::app::render::render_text;
use flowscope::config::Settings;
use flowscope::App;

#[derive(Parser)]
#[command(
    name = "flowscope",
    about = "Inspect marketing flows and get AI feedback on their subject lines"
)]
struct Cli {
    /// Number of flows to fetch (1-100)
    #[arg(long, default_value_t = 25)]
    limit: u32,

    /// Skip the generation backend and use fallback feedback
    #[arg(long)]
    no_ai: bool,

    /// Total attempts for a rate limited flow-actions fetch
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting flowscope");

    let mut settings = Settings::from_env();
    settings.marketing.page_size = Settings::clamp_page_size(cli.limit);
    settings.generation.enabled = !cli.no_ai;
    settings.resolver.max_retries = cli.max_retries.max(1);

    let app = match App::new(settings) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!("Startup failed: {:#}", e);
            eprintln!("flowscope: {:#}", e);
            std::process::exit(1);
        }
    };

    let report = app.run().await;

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                tracing::error!("Failed to encode report: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        print!("{}", render_text(&report));
    }
}
