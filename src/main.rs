//! The Hadron integration test harness CLI.

use anyhow::Result;
use structopt::StructOpt;

use hadron_itest::cmd::Itest;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Itest::from_args();
    cli.run().await
}
