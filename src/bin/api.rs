use std::sync::Arc;

use tracing::info;
use wealth_coach_agent::api::start_server;
use wealth_coach_agent::dialogue::DialogueManager;
use wealth_coach_agent::report::NoopExporter;
use wealth_coach_agent::responder::{GeminiResponder, MockResponder, Responder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let responder: Box<dyn Responder> = match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.is_empty() => Box::new(GeminiResponder::new(key)?),
        _ => {
            eprintln!("GEMINI_API_KEY not set - free chat will use local answers only");
            Box::new(MockResponder)
        }
    };

    let api_port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("API_PORT"))
        .unwrap_or_else(|_| "8080".to_string())
        .parse()?;

    info!("Wealth Coach Agent - API Server");
    info!("Port: {}", api_port);

    let manager = Arc::new(DialogueManager::new(responder));
    let exporter = Arc::new(NoopExporter);

    info!("Dialogue manager initialized");
    info!("Starting API server...");

    start_server(manager, exporter, api_port).await?;

    Ok(())
}
