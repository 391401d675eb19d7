use tracing::info;
use tracing_subscriber::EnvFilter;

use inkpost::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = Config::from_env()?;
    info!("inkpost starting");
    info!("  db root:        {}", cfg.db_root);
    info!("  http port:      {}", cfg.http_port);
    info!("  secure cookies: {}", cfg.secure_cookies);

    inkpost::server::run(cfg).await
}
