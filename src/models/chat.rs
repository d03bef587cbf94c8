use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

// One entry in a session's conversation log. The log is append-only and is
// replayed to the model in full on every turn, so entries the model emitted
// must survive a serialize round trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEntry {
    Message {
        role: Role,
        content: Value,
    },
    FunctionCall {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        name: String,
        arguments: String,
        call_id: String,
    },
    FunctionCallOutput {
        call_id: String,
        output: String,
    },
    // Reasoning items and any future output kinds pass through verbatim.
    #[serde(untagged)]
    Other(Value),
}

impl ChatEntry {
    pub fn user(text: impl Into<String>) -> Self {
        ChatEntry::Message {
            role: Role::User,
            content: Value::String(text.into()),
        }
    }

    pub fn function_output(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        ChatEntry::FunctionCallOutput {
            call_id: call_id.into(),
            output: output.into(),
        }
    }

    // Plain text of an assistant message entry. Model output carries content
    // as a list of output_text parts; our own messages carry a bare string.
    pub fn assistant_text(&self) -> Option<String> {
        let ChatEntry::Message {
            role: Role::Assistant,
            content,
        } = self
        else {
            return None;
        };
        match content {
            Value::String(text) => Some(text.clone()),
            Value::Array(parts) => {
                let mut text = String::new();
                for part in parts {
                    if let Some(chunk) = part.get("text").and_then(Value::as_str) {
                        text.push_str(chunk);
                    }
                }
                if text.is_empty() { None } else { Some(text) }
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub log: Vec<ChatEntry>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Session {
            id: id.into(),
            log: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn push(&mut self, entry: ChatEntry) {
        self.log.push(entry);
    }
}
