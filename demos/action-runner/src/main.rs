//! Run a Myne action from the command line.
//!
//! Usage: action-runner <action-name> [key=value ...]
//!
//! The encoded session token is read from the `MYNE_TOKEN` environment
//! variable, exactly as a browser app would receive it in the `myneToken`
//! redirect parameter.

use std::collections::HashMap;

use anyhow::{Context, bail};
use myne_client::{MemoryTokenStore, QueryString, SessionClient, TOKEN_KEY, registration_url};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(action) = args.next() else {
        bail!("usage: action-runner <action-name> [key=value ...]");
    };

    let mut params = HashMap::new();
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .with_context(|| format!("parameter '{arg}' is not of the form key=value"))?;
        params.insert(key.to_owned(), value.to_owned());
    }

    let query = std::env::var("MYNE_TOKEN")
        .map(|token| QueryString::new(format!("{TOKEN_KEY}={token}")))
        .unwrap_or_else(|_| QueryString::new(""));

    let client = SessionClient::new(&query, MemoryTokenStore::new());
    if !client.user_logged_in() {
        bail!(
            "no usable session token in MYNE_TOKEN; register your app and log in at {}",
            registration_url("<your-app-id>", "<your-redirect-url>")
        );
    }

    let result = client.execute_action(&action, &params).await?;

    tracing::info!(
        "action '{action}' returned {} nodes, {} relations",
        result.nodes.len(),
        result.relations.len()
    );
    for node in &result.nodes {
        println!("node     {}  {}  (by {})", node.id, node.name, node.authored_by);
    }
    for relation in &result.relations {
        println!(
            "relation {}  {}  {} -> {}",
            relation.id, relation.name, relation.node_out_id, relation.node_in_id
        );
    }

    Ok(())
}
