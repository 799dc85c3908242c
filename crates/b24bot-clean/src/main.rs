//! Remove every robot the application has registered on the installed portal.

use anyhow::Context;

use b24bot_core::{
    config::Config,
    ports::{PlatformConnector, TokenStore},
    token_store::JsonFileTokenStore,
};
use b24bot_rest::BitrixConnector;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    b24bot_core::logging::init("b24bot-clean")?;

    let cfg = Config::load()?;
    let store = JsonFileTokenStore::new(&cfg.tokens_file);

    let Some(credential) = store.load().await.filter(|c| c.is_usable()) else {
        println!(
            "No usable credential in {}. Install the application first.",
            cfg.tokens_file.display()
        );
        return Ok(());
    };

    let http = b24bot_rest::http_client(cfg.request_timeout)?;
    let client = BitrixConnector::new(http).connect(&credential.domain, &credential.access_token);

    let robots = client
        .list_robots()
        .await
        .with_context(|| format!("listing robots on {}", credential.domain))?;

    if robots.is_empty() {
        println!("No robots registered on {}.", credential.domain);
        return Ok(());
    }
    println!("Found {} robot(s) on {}", robots.len(), credential.domain);

    let mut deleted = 0usize;
    for robot in &robots {
        let name = robot.name.as_deref().unwrap_or("(unnamed)");
        println!("Deleting robot: {name} (code: {})", robot.code);
        match client.delete_robot(&robot.code).await {
            Ok(()) => deleted += 1,
            Err(e) => tracing::warn!(code = %robot.code, "delete failed: {e}"),
        }
    }

    println!("Done: {deleted}/{} deleted", robots.len());
    Ok(())
}
