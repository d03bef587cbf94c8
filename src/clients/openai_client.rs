use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::BotError;
use crate::models::chat::ChatEntry;
use crate::service::tools::{ToolDefinition, tool_definitions};

const RESPONSES_API_URL: &str = "https://api.openai.com/v1/responses";

pub const ASSISTANT_INSTRUCTIONS: &str = "You are a helpful assistant that helps people manage their calendar bookings. You can call functions to list, create, cancel, and reschedule bookings as needed. If information is missing, ask the user for more details before calling a function. Before cancelling or rescheduling a booking, make sure to get confirm the booking details with the user. If you have provided a final response to the user, stop and do not call any more functions.";

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    instructions: &'a str,
    tools: Vec<Value>,
    input: &'a [ChatEntry],
}

#[derive(Debug, Deserialize)]
struct ResponsesReply {
    output: Vec<ChatEntry>,
}

fn to_responses_tool(tool: &ToolDefinition) -> Value {
    json!({
        "type": "function",
        "name": tool.name,
        "description": tool.description,
        "parameters": tool.parameters,
    })
}

pub async fn create_response(
    http: &reqwest::Client,
    api_key: &str,
    model: &str,
    input: &[ChatEntry],
) -> Result<Vec<ChatEntry>, BotError> {
    let request = ResponsesRequest {
        model,
        instructions: ASSISTANT_INSTRUCTIONS,
        tools: tool_definitions().iter().map(to_responses_tool).collect(),
        input,
    };

    let response = http
        .post(RESPONSES_API_URL)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&request)
        .send()
        .await
        .map_err(|e| BotError::OpenAI(e.to_string()))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| BotError::OpenAI(e.to_string()))?;

    if !status.is_success() {
        return Err(BotError::OpenAI(format!("status {}: {}", status, text)));
    }

    let parsed: ResponsesReply = serde_json::from_str(&text).map_err(|e| {
        BotError::OpenAI(format!("failed to parse JSON: {}\nRaw body: {}", e, text))
    })?;
    debug!(items = parsed.output.len(), "model turn received");
    Ok(parsed.output)
}
