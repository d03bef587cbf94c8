use std::sync::Arc;

use clap::Parser;
use inquire::Text;

use crate::service::chat_service::ChatService;
use crate::service::session_service::SessionStore;

#[derive(Parser)]
pub struct Cli {
    #[arg(long)]
    pub run_mode: Option<String>,
    #[arg(long)]
    pub port: Option<u16>,
}

// Interactive chat surface: one minted session for the process lifetime,
// prompt in, assistant text out.
pub async fn chat(chat: Arc<ChatService>, sessions: Arc<SessionStore>) {
    println!("Hi! I can help you with your calendar bookings!");

    let session_id = SessionStore::mint_id();
    let session = sessions.get_or_create(&session_id).await;

    loop {
        // Esc / Ctrl-C ends the chat.
        let Ok(line) = Text::new("You:").prompt() else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let mut session = session.lock().await;
        match chat.handle_message(&mut session, &line).await {
            Ok(reply) => println!("{}", reply),
            Err(e) => println!("Failed to handle message: {}", e),
        }
    }
}
