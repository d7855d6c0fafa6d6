use anyhow::Result;
use reqwest::blocking::Client;
use sisascraper::{config, export, paths};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let config = config::argentina();
    info!(country = config.location, "startup");

    let client = Client::new();
    let out_dir = paths::automated_sheets_dir();
    let path = export::export(&client, &config, &out_dir)?;

    info!(path = %path.display(), "done");
    Ok(())
}
