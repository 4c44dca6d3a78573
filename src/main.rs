use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use flirt_relay::config::{Settings, TransportMode};
use flirt_relay::core::{run_expiry_sweeper, Dispatcher, PairingEngine, ProfileDialog};
use flirt_relay::routes::{self, chat::AppState};
use flirt_relay::services::{run_polling, InMemoryTransport, TelegramClient, Transport};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle path payload errors (e.g. a non-numeric user id)
pub fn handle_path_error(err: error::PathError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_path".to_string(),
        message: format!("Invalid path: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load().and_then(|s| s.validate().map(|()| s)) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_logging(&settings.logging.level, &settings.logging.format);

    info!("Starting Flirt Relay...");

    let engine = PairingEngine::new();
    let dialog = ProfileDialog::new(
        settings.dialog.max_pending,
        Duration::from_secs(settings.dialog.idle_timeout_secs),
    );

    // Pick the outbound transport
    let mut telegram: Option<Arc<TelegramClient>> = None;
    let mut outbox: Option<Arc<InMemoryTransport>> = None;

    let transport: Arc<dyn Transport> = match settings.telegram.mode {
        TransportMode::Disabled => {
            info!("Telegram disabled, keeping outbound messages in memory");
            let memory = Arc::new(InMemoryTransport::new());
            outbox = Some(memory.clone());
            memory
        }
        mode => {
            let token = settings.telegram.bot_token.clone().unwrap_or_default();
            let client = TelegramClient::new(
                settings.telegram.api_base.clone(),
                token,
                Duration::from_secs(settings.telegram.request_timeout_secs),
            )
            .map_err(|e| {
                error!("Failed to create Telegram client: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?;
            info!("Telegram transport initialized ({:?})", mode);
            let client = Arc::new(client);
            telegram = Some(client.clone());
            client
        }
    };

    let dispatcher = Dispatcher::new(engine, dialog, transport);

    if let Some(ttl) = settings.pairing.waiting_ttl() {
        tokio::spawn(run_expiry_sweeper(
            dispatcher.clone(),
            ttl,
            settings.pairing.sweep_interval(),
        ));
    }

    if settings.telegram.mode == TransportMode::Polling {
        if let Some(client) = telegram {
            let dispatcher = dispatcher.clone();
            let timeout = settings.telegram.poll_timeout_secs;
            tokio::spawn(async move {
                run_polling(&client, &dispatcher, timeout).await;
            });
        }
    }

    let app_state = AppState {
        dispatcher,
        outbox,
        webhook_secret: settings.telegram.webhook_secret.clone(),
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
