use std::env;

use anyhow::{Context, Result};
use futures::TryStreamExt;
use nicocreator_rs::{ClientConfig, Credential, NicoClient, PageQuery, paginate};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nicocreator_rs=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <cookies.json> [page_size]", args[0]);
        eprintln!("  cookies.json: cookie export from the browser extension");
        std::process::exit(1);
    }

    let raw = std::fs::read_to_string(&args[1])
        .with_context(|| format!("read cookie file {}", args[1]))?;
    let credential = Credential::from_json(&raw)?;

    let page_size = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(PageQuery::default().page_size);

    let client = NicoClient::with_config(credential, ClientConfig::from_env())?;
    let videos = client.videos();

    let all: Vec<_> = paginate(PageQuery::new(1, page_size), |query| videos.list(query))
        .try_collect()
        .await?;

    println!("{} video(s)", all.len());
    for video in &all {
        let views = video.count.map(|c| c.view).unwrap_or_default();
        println!(
            "{}  {:>8} views  {}",
            video.id, views, video.title
        );
    }

    Ok(())
}
