use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::error;
use warp::http::StatusCode;

use crate::error::BotError;
use crate::service::chat_service::ChatService;
use crate::service::session_service::SessionStore;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub error: String,
}

#[derive(Clone)]
pub struct HttpState {
    pub chat: Arc<ChatService>,
    pub sessions: Arc<SessionStore>,
}

// POST / — one stateless chat exchange. A missing sessionId mints a fresh
// session; an unknown one is a 404, never an implicit create under the
// caller's id.
pub async fn handle_chat(
    state: HttpState,
    request: ChatRequest,
) -> Result<impl warp::Reply, warp::Rejection> {
    let session = match &request.session_id {
        Some(id) => match state.sessions.get(id).await {
            Some(session) => session,
            None => {
                return Ok(warp::reply::with_status(
                    warp::reply::json(&ErrorMessage {
                        error: BotError::UnknownSession(id.clone()).to_string(),
                    }),
                    StatusCode::NOT_FOUND,
                ));
            }
        },
        None => {
            let id = SessionStore::mint_id();
            state.sessions.get_or_create(&id).await
        }
    };

    let mut session = session.lock().await;
    match state.chat.handle_message(&mut session, &request.message).await {
        Ok(response) => Ok(warp::reply::with_status(
            warp::reply::json(&ChatResponse {
                response,
                session_id: session.id.clone(),
            }),
            StatusCode::OK,
        )),
        Err(err) => {
            error!(session = %session.id, error = %err, "chat request failed");
            Ok(warp::reply::with_status(
                warp::reply::json(&ErrorMessage {
                    error: err.to_string(),
                }),
                StatusCode::BAD_GATEWAY,
            ))
        }
    }
}
