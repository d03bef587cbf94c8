use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{info, warn};

use crate::error::BotError;
use crate::models::chat::{ChatEntry, Session};
use crate::service::booking_service::BookingService;
use crate::service::openai_service::OpenAIClient;
use crate::service::tools::ToolKind;

// A real conversation settles in a handful of passes (lookup, action,
// summary); the cap only exists to bound a model that never stops calling.
pub const MAX_TOOL_PASSES: u32 = 8;

pub struct ChatService {
    openai: Arc<dyn OpenAIClient>,
    bookings: BookingService,
}

impl ChatService {
    pub fn new(openai: Arc<dyn OpenAIClient>, bookings: BookingService) -> Self {
        Self { openai, bookings }
    }

    // Runs the tool dispatch loop for one user message: ask the model for a
    // turn, execute any function calls in the order the model listed them,
    // and go again until a turn arrives with no calls. Returns that turn's
    // assistant text.
    pub async fn handle_message(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<String, BotError> {
        session.push(ChatEntry::user(text));

        for pass in 0..MAX_TOOL_PASSES {
            let turn = self.openai.next_turn(&session.log).await?;
            session.log.extend(turn.output.iter().cloned());

            let calls: Vec<(String, String, String)> = turn
                .output
                .iter()
                .filter_map(|entry| match entry {
                    ChatEntry::FunctionCall {
                        name,
                        arguments,
                        call_id,
                        ..
                    } => Some((name.clone(), arguments.clone(), call_id.clone())),
                    _ => None,
                })
                .collect();

            if calls.is_empty() {
                return Ok(turn.output_text());
            }

            info!(session = %session.id, pass, calls = calls.len(), "executing tool calls");
            for (name, arguments, call_id) in calls {
                self.dispatch(&mut session.log, &name, &arguments, &call_id)
                    .await?;
            }
        }

        Err(BotError::ToolLoopLimit(MAX_TOOL_PASSES))
    }

    // Every function_call gets exactly one function_call_output, including the
    // unknown-name and bad-arguments cases. Skipping the output would leave an
    // unpaired call in the log and break every later turn of the session.
    async fn dispatch(
        &self,
        log: &mut Vec<ChatEntry>,
        name: &str,
        arguments: &str,
        call_id: &str,
    ) -> Result<(), BotError> {
        let Some(kind) = ToolKind::from_name(name) else {
            warn!(tool = name, "model called an unknown tool");
            log.push(error_output(call_id, format!("unknown function: {}", name)));
            return Ok(());
        };

        match self.invoke(kind, log, arguments, call_id).await {
            Ok(()) => Ok(()),
            Err(BotError::BadToolArgs { name, source }) => {
                warn!(tool = %name, error = %source, "tool arguments failed to parse");
                log.push(error_output(
                    call_id,
                    format!("invalid arguments for {}: {}", name, source),
                ));
                Ok(())
            }
            Err(other) => Err(other),
        }
    }

    async fn invoke(
        &self,
        kind: ToolKind,
        log: &mut Vec<ChatEntry>,
        arguments: &str,
        call_id: &str,
    ) -> Result<(), BotError> {
        match kind {
            ToolKind::ListAllUpcomingBookings => {
                let args = parse_args(kind, arguments)?;
                self.bookings
                    .list_all_upcoming_bookings(log, call_id, args)
                    .await
            }
            ToolKind::CreateBooking => {
                let args = parse_args(kind, arguments)?;
                self.bookings.create_booking(log, call_id, args).await
            }
            ToolKind::LookUpFirstBooking => {
                let args = parse_args(kind, arguments)?;
                self.bookings.look_up_first_booking(log, call_id, args).await
            }
            ToolKind::CancelFirstBooking => {
                let args = parse_args(kind, arguments)?;
                self.bookings.cancel_first_booking(log, call_id, args).await
            }
            ToolKind::RescheduleFirstBooking => {
                let args = parse_args(kind, arguments)?;
                self.bookings
                    .reschedule_first_booking(log, call_id, args)
                    .await
            }
        }
    }
}

fn parse_args<T: DeserializeOwned>(kind: ToolKind, arguments: &str) -> Result<T, BotError> {
    serde_json::from_str(arguments).map_err(|source| BotError::BadToolArgs {
        name: kind.name().to_string(),
        source,
    })
}

fn error_output(call_id: &str, message: String) -> ChatEntry {
    ChatEntry::function_output(call_id, json!({ "error": message }).to_string())
}
