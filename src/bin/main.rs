use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use wealth_coach_agent::dialogue::DialogueManager;
use wealth_coach_agent::models::ConversationState;
use wealth_coach_agent::responder::{GeminiResponder, MockResponder, Responder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
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

    let manager = Arc::new(DialogueManager::new(responder));
    let mut state = ConversationState::new();

    info!("Wealth Coach - interactive session started");
    println!("Wealth Coach (type 'quit' to exit)");
    print_prompt().await?;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            break;
        }

        let (reply, updated) = manager.handle_turn(state, input).await?;
        state = updated;

        println!("{}", reply.text);
        print_prompt().await?;
    }

    println!("Goodbye!");
    Ok(())
}

async fn print_prompt() -> std::io::Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"> ").await?;
    stdout.flush().await
}
