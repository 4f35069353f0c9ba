use anyhow::Result;
use clap::Parser;
use personachat::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    personachat::run(args).await
}
