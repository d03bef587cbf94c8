use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("OpenAI request failed: {0}")]
    OpenAI(String),
    #[error("Cal API request failed: {0}")]
    Booking(String),
    #[error("bad arguments for tool {name}: {source}")]
    BadToolArgs {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown session: {0}")]
    UnknownSession(String),
    #[error("tool loop did not settle within {0} passes")]
    ToolLoopLimit(u32),
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),
}
