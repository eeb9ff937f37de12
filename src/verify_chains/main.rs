// Scans the persisted stop-node graph for structural corruption: dangling
// forward pointers and next-pointer cycles. Read-only; repairs are left to
// the operator.

use anyhow::Context;
use dotenvy::dotenv;
use stagecoach::chain::{traverse, verify};
use stagecoach::store::{ChainStore, PostgresChainStore};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set, e.g. in .env")?;
    let store = PostgresChainStore::connect(&database_url).await?;

    let graph = store.load_graph().await?;
    let routes = store.list_routes().await?;
    println!("loaded {} stop nodes across {} routes", graph.len(), routes.len());

    for route in &routes {
        let chain = traverse::full_chain(&graph, route.id);
        let owned = graph.owned_by(route.id).len();
        let merged = chain.len().saturating_sub(owned);
        println!(
            "route {} ({}): {} nodes in chain, {} owned, {} merged from other routes",
            route.id,
            route.name,
            chain.len(),
            owned,
            merged
        );
    }

    let issues = verify::scan(&graph);
    if issues.is_empty() {
        println!("no integrity issues found");
        return Ok(());
    }

    for issue in &issues {
        tracing::error!("{issue}");
    }
    anyhow::bail!("{} integrity issue(s) found", issues.len());
}
