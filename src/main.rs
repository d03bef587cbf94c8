use std::env;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use bookingbot::cli::{self, Cli};
use bookingbot::clients::cal_client::{CalApi, CalClient};
use bookingbot::config::{AppConfig, Settings};
use bookingbot::handlers::http::HttpState;
use bookingbot::runtime;
use bookingbot::service::booking_service::BookingService;
use bookingbot::service::chat_service::ChatService;
use bookingbot::service::openai_service::{OpenAIClient, OpenAIService};
use bookingbot::service::session_service::SessionStore;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Cli::parse();

    let config = match env::var("CONFIG_FILE") {
        Ok(path) => AppConfig::from_file(&path).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    };
    let mut settings = match Settings::resolve(&config) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    if let Some(mode) = args.run_mode {
        settings.run_mode = mode;
    }
    if let Some(port) = args.port {
        settings.port = port;
    }

    let openai: Arc<dyn OpenAIClient> = Arc::new(OpenAIService::new(
        settings.openai_api_key.clone(),
        settings.openai_model.clone(),
    ));
    let cal: Arc<dyn CalApi> = Arc::new(CalClient::new(
        settings.cal_base_url.clone(),
        settings.cal_api_key.clone(),
    ));
    let bookings = BookingService::new(cal, settings.event_type_id);
    let chat = Arc::new(ChatService::new(openai, bookings));
    let sessions = Arc::new(SessionStore::new());

    if settings.run_mode == "api" {
        runtime::run_api(HttpState { chat, sessions }, settings.port).await;
    } else if settings.run_mode == "cli" {
        cli::chat(chat, sessions).await;
    } else {
        println!("Invalid run mode {}", settings.run_mode);
    }
}
