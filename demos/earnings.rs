use std::env;

use anyhow::{Context, Result};
use nicocreator_rs::{ClientConfig, Credential, Earnings, NicoClient, OffsetQuery};
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
        eprintln!("Usage: {} <cookies.json> [YYYYMM]", args[0]);
        eprintln!("  without YYYYMM the newest available month is shown");
        std::process::exit(1);
    }

    let raw = std::fs::read_to_string(&args[1])
        .with_context(|| format!("read cookie file {}", args[1]))?;
    let credential = Credential::from_json(&raw)?;
    let client = NicoClient::with_config(credential, ClientConfig::from_env())?;

    let query = OffsetQuery::new(0, 50);
    let earnings = match args.get(2) {
        Some(year_month) => client.earnings().history(year_month, query).await?,
        None => client.earnings().current(query).await?,
    };

    print_earnings(&earnings);
    Ok(())
}

fn print_earnings(earnings: &Earnings) {
    println!("Earnings for {}", earnings.period);
    if let Some(total) = earnings.total_amount {
        println!("Total: {:.2}", total);
    }
    for item in &earnings.page.items {
        println!(
            "  {:<12} {:>10.2}  {}",
            item.content_id,
            item.amount,
            item.title.as_deref().unwrap_or("-")
        );
    }
    if earnings.page.has_more {
        println!(
            "  ... {} more",
            earnings.page.total_count - earnings.page.items.len() as u64
        );
    }
}
