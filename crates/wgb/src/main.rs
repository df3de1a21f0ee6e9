use std::sync::Arc;

use wgb_core::{
    config::Config,
    cooldown::RateLimiter,
    dictionary::{Dictionary, BUILTIN},
    handlers::Handlers,
    hints::{DefinitionProvider, NoDefinitions},
    lobby::LobbyController,
    messaging::{
        port::MessagingPort,
        throttled::{ThrottleConfig, ThrottledMessenger},
    },
    registry::GameRegistry,
    stats::StatsStore,
};
use wgb_hints::HintClient;

mod console;

#[tokio::main]
async fn main() -> Result<(), wgb_core::Error> {
    wgb_core::logging::init("wgb")?;

    let cfg = Arc::new(Config::load()?);

    let dict = match &cfg.dictionary_path {
        Some(path) => Arc::new(Dictionary::load(path)?),
        None => Arc::new(BUILTIN.clone()),
    };
    tracing::info!(words = dict.len(), "dictionary loaded");

    let definitions: Arc<dyn DefinitionProvider> = match &cfg.hint_api_key {
        Some(key) => Arc::new(HintClient::new(key.clone(), cfg.hint_timeout)?),
        None => {
            tracing::info!("no hint API key; definitions disabled");
            Arc::new(NoDefinitions)
        }
    };

    let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
        Arc::new(console::ConsoleMessenger),
        ThrottleConfig::default(),
    ));

    let stats = Arc::new(StatsStore::open(cfg.stats_file.clone()));
    let registry = Arc::new(GameRegistry::new());
    let limiter = Arc::new(RateLimiter::new());

    let lobby = LobbyController::new(
        cfg.clone(),
        dict,
        registry,
        stats.clone(),
        messenger.clone(),
        definitions,
    );
    let handlers = Arc::new(Handlers::new(lobby, limiter.clone(), messenger));

    // Periodic sweep of idle rate-limiter entries.
    let sweeper = {
        let limiter = limiter.clone();
        let cfg = cfg.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(cfg.cleanup_interval);
            tick.tick().await; // first tick fires immediately
            loop {
                tick.tick().await;
                limiter.cleanup(cfg.cooldown_expiry).await;
            }
        })
    };

    tracing::info!("ready; type `<user_id> /hangman` to open a lobby");

    let input = {
        let handlers = handlers.clone();
        async move {
            console::run_input_loop(|update| {
                let handlers = handlers.clone();
                async move { handlers.handle(update).await }
            })
            .await;
        }
    };

    tokio::select! {
        _ = input => {
            tracing::info!("input closed, shutting down");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received, shutting down");
        }
    }

    sweeper.abort();
    stats.flush().await?;
    Ok(())
}
