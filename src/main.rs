use std::sync::Arc;

mod app;
mod client;
mod config;
mod error;
mod job;
mod state;
mod ui;

use app::App;
use client::{GenerationClient, OpenAiClient};
use config::AppConfig;
use state::library::Library;

fn main() -> iced::Result {
    config::load_env_files();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env();
    if config.api_key.is_none() {
        log::warn!("No API credential found; generation will fail until OPENAI_API is set");
    }

    // Without its image folder or an HTTP client the app has nothing to show.
    let library = match Library::open(&config.images_dir) {
        Ok(library) => library,
        Err(error) => {
            log::error!(
                "Could not open image folder {}: {error}",
                config.images_dir.display()
            );
            std::process::exit(1);
        }
    };
    let client: Arc<dyn GenerationClient> = match OpenAiClient::new(&config) {
        Ok(client) => Arc::new(client),
        Err(error) => {
            log::error!("Could not set up the HTTP client: {error}");
            std::process::exit(1);
        }
    };

    iced::daemon(App::title, App::update, App::view)
        .theme(App::theme)
        .subscription(App::subscription)
        .run_with(move || App::new(client, library))
}
