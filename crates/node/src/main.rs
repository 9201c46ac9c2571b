use cerera_node::{Cli, Node, NodeConfig};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cerera_node::logging::init();

    let cli = Cli::parse();
    let config = NodeConfig::resolve(cli)?;

    tracing::info!(chain_id = config.chain_id, difficulty = config.difficulty, "starting cerera node");

    let node = Node::bootstrap(config).await?;
    if node.config.solo {
        tracing::info!("solo mode: consensus gate opened immediately");
    }
    node.spawn_miner().await;

    tracing::info!("node is running; press ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");
    node.stop_miner().await;

    Ok(())
}
