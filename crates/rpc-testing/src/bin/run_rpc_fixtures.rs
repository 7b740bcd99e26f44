//! Replays the blockchain fixtures found under FIXTURES_PATH against the node
//! listening at RPC_URL, then prints a summary of the run.
use rpc_testing::{
    config::RunnerConfig,
    models::suite::BlockchainTestSuite,
    rpc::{HttpTransport, RpcClient},
    traits::Suite,
};
use tracing_subscriber::{filter, FmtSubscriber};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let filter = filter::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| filter::EnvFilter::new("rpc_testing=info,build_utils=info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = RunnerConfig::from_env();
    let suite_name = std::env::args().nth(1).unwrap_or_default();
    let fixtures_filter = config.load_filter()?;
    let client = RpcClient::new(HttpTransport::new(&config.rpc_url)?);
    tracing::info!(
        "replaying {} against {}",
        config.fixtures_path.join(&suite_name).display(),
        config.rpc_url
    );

    let report = BlockchainTestSuite::new(suite_name, config.fixtures_path.clone(), fixtures_filter)
        .run(&client)
        .await?;

    for failure in report.failures() {
        println!("FAILED {} ({}): {}", failure.name, failure.path.display(), failure.outcome);
    }
    println!("{}: {}", report.suite_name, report.summary());

    if report.has_failures() {
        std::process::exit(1);
    }
    Ok(())
}
