use anyhow::Result;
use betbck_ev::config::Config;
use betbck_ev::feed::http::HttpReferenceFeed;
use betbck_ev::pipeline::Pipeline;
use betbck_ev::scrape::http::HttpScraper;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn usage() -> ! {
    eprintln!("usage: betbck-ev run [--config <path>]");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_file = std::fs::File::create("betbck-ev.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "betbck_ev=info".into()),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .init();

    // --- CLI: a single `run` command ---
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut config_path = PathBuf::from("config.toml");
    let mut command = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "run" => command = Some("run"),
            "--config" => match iter.next() {
                Some(path) => config_path = PathBuf::from(path),
                None => usage(),
            },
            _ => usage(),
        }
    }
    if command != Some("run") {
        usage();
    }

    let config = Config::load(&config_path)?;

    let feed = Arc::new(HttpReferenceFeed::new(
        &config.feed.base_url,
        config.feed.request_timeout_seconds,
    ));
    let scraper = Arc::new(HttpScraper::new(
        &config.scraper.base_url,
        config.scraper.request_timeout_seconds,
        config.scraper.search_timeout_seconds,
        config.scraper.scrape_timeout_seconds,
    ));

    let pipeline = Pipeline::new(config, feed, scraper)?;

    // Ctrl-C stops new scrape submissions; in-flight work drains.
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            signal_cancel.cancel();
        }
    });

    let report = pipeline.run(cancel).await?;
    println!(
        "matched {} games ({} secondary / {} reference unmatched)",
        report.total_matches,
        report.unmatched_secondary_count,
        report.unmatched_reference_count,
    );
    // Zero matches is still a successful run.
    Ok(())
}
