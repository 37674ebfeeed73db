use anyhow::{bail, Result};
use satfetch::{config::Config, download, fetch::EsriImageClient};
use std::{env, io};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
    info!("startup");

    // ─── 2) config: defaults, or a YAML file given as the only argument ──
    let args: Vec<String> = env::args().skip(1).collect();
    let config = match args.as_slice() {
        [] => Config::default(),
        [path] => Config::load(path)?,
        _ => bail!("usage: satfetch [config.yaml]"),
    };
    info!(
        endpoint = %config.endpoint,
        images_dir = %config.images_dir.display(),
        splits = config.splits.len(),
        "configured"
    );

    // ─── 3) download every split ─────────────────────────────────────
    let client = EsriImageClient::new(&config)?;
    let mut stdout = io::stdout().lock();
    let summaries = download::run(&config, &client, &mut stdout).await?;

    for (name, s) in &summaries {
        info!(
            split = %name,
            attempted = s.attempted,
            saved = s.saved,
            http_failures = s.http_failures,
            transport_failures = s.transport_failures,
            "summary"
        );
    }
    info!("all done");
    Ok(())
}
