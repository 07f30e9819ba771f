mod api;
mod cli;
mod config;
mod models;
mod output;
mod stats;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::run().await
}
