use std::sync::Arc;

use b24bot_core::{
    config::Config, install::Installer, ports::TokenStore, service::RobotService,
    token_store::JsonFileTokenStore,
};
use b24bot_rest::{BitrixConnector, BitrixOAuth};
use b24bot_web::AppState;

#[tokio::main]
async fn main() -> Result<(), b24bot_core::Error> {
    b24bot_core::logging::init("b24bot")?;

    let cfg = Config::load()?;
    let http = b24bot_rest::http_client(cfg.request_timeout)?;

    let store: Arc<dyn TokenStore> = Arc::new(JsonFileTokenStore::new(&cfg.tokens_file));
    let robots = Arc::new(RobotService::new(
        store.clone(),
        Arc::new(BitrixConnector::new(http.clone())),
        cfg.handler_url(),
    ));
    let installer = Arc::new(Installer::new(
        store,
        Arc::new(BitrixOAuth::new(http, &cfg)?),
        robots.clone(),
    ));

    print_startup(&cfg);
    b24bot_web::serve(cfg.bind_addr, AppState { installer, robots }).await
}

fn print_startup(cfg: &Config) {
    println!("b24bot started");
    println!("Install URL: {}", cfg.redirect_uri());
    println!("Handler URL: {}", cfg.handler_url());
    println!("Tokens file: {}", cfg.tokens_file.display());
}
