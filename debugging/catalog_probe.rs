//! Fetch one catalog resource and print its raw JSON.
//! Usage:
//!   cargo run --bin catalog_probe -- /movie/550 append_to_response=videos
//!   cargo run --bin catalog_probe -- /search/tv query=severance page=2
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use dotenvy::dotenv;
use moviefun::catalog::CatalogClient;
use moviefun::config::CatalogConfig;
use std::env;

fn parse_param(arg: &str) -> Result<(&str, &str)> {
    arg.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| anyhow::anyhow!("parameter must look like key=value, got '{arg}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo run --bin catalog_probe -- <path> [key=value ...]");
        std::process::exit(1);
    }

    let path = &args[1];
    let params = args[2..]
        .iter()
        .map(|arg| parse_param(arg))
        .collect::<Result<Vec<_>>>()?;

    let client = CatalogClient::new(CatalogConfig::from_env()?)?;
    let body = client
        .fetch_resource(path, &params)
        .await
        .with_context(|| format!("fetching {path}"))?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
