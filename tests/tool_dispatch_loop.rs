use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use serde_json::json;

use bookingbot::clients::cal_client::{BookingQuery, CalApi, CreateBookingBody};
use bookingbot::error::BotError;
use bookingbot::models::chat::{ChatEntry, Role, Session};
use bookingbot::service::booking_service::BookingService;
use bookingbot::service::chat_service::{ChatService, MAX_TOOL_PASSES};
use bookingbot::service::openai_service::{OpenAIClient, ModelTurn};

fn call(name: &str, call_id: &str, arguments: serde_json::Value) -> ChatEntry {
    ChatEntry::FunctionCall {
        id: None,
        name: name.to_string(),
        arguments: arguments.to_string(),
        call_id: call_id.to_string(),
    }
}

fn assistant(text: &str) -> ChatEntry {
    ChatEntry::Message {
        role: Role::Assistant,
        content: json!([{"type": "output_text", "text": text}]),
    }
}

struct ScriptedOpenAI {
    turns: StdMutex<VecDeque<Vec<ChatEntry>>>,
    inputs: StdMutex<Vec<Vec<ChatEntry>>>,
}

impl ScriptedOpenAI {
    fn scripted(turns: Vec<Vec<ChatEntry>>) -> Arc<Self> {
        Arc::new(Self {
            turns: StdMutex::new(turns.into()),
            inputs: StdMutex::new(Vec::new()),
        })
    }

    fn inputs(&self) -> Vec<Vec<ChatEntry>> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl OpenAIClient for ScriptedOpenAI {
    async fn next_turn(&self, input: &[ChatEntry]) -> Result<ModelTurn, BotError> {
        self.inputs.lock().unwrap().push(input.to_vec());
        let output = self.turns.lock().unwrap().pop_front().unwrap_or_default();
        Ok(ModelTurn { output })
    }
}

// Models the unbounded pathological case: a function call on every turn.
struct AlwaysCallsOpenAI {
    turns_served: StdMutex<u32>,
}

#[async_trait]
impl OpenAIClient for AlwaysCallsOpenAI {
    async fn next_turn(&self, _input: &[ChatEntry]) -> Result<ModelTurn, BotError> {
        let mut served = self.turns_served.lock().unwrap();
        *served += 1;
        Ok(ModelTurn {
            output: vec![call(
                "list_all_upcoming_bookings",
                &format!("call_{}", *served),
                json!({"attendeeEmail": "a@b.c"}),
            )],
        })
    }
}

struct FakeCalApi {
    lookup_body: String,
    action_body: String,
    calls: StdMutex<Vec<String>>,
}

impl FakeCalApi {
    fn new(lookup_body: &str, action_body: &str) -> Arc<Self> {
        Arc::new(Self {
            lookup_body: lookup_body.to_string(),
            action_body: action_body.to_string(),
            calls: StdMutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalApi for FakeCalApi {
    async fn get_bookings(&self, _query: &BookingQuery) -> Result<String, BotError> {
        self.calls.lock().unwrap().push("get".to_string());
        Ok(self.lookup_body.clone())
    }

    async fn create_booking(&self, _body: &CreateBookingBody) -> Result<String, BotError> {
        self.calls.lock().unwrap().push("create".to_string());
        Ok(self.action_body.clone())
    }

    async fn cancel_booking(&self, uid: &str, _reason: &str) -> Result<String, BotError> {
        self.calls.lock().unwrap().push(format!("cancel {}", uid));
        Ok(self.action_body.clone())
    }

    async fn reschedule_booking(
        &self,
        uid: &str,
        _start: &str,
        _reason: &str,
    ) -> Result<String, BotError> {
        self.calls.lock().unwrap().push(format!("reschedule {}", uid));
        Ok(self.action_body.clone())
    }
}

const ONE_BOOKING: &str =
    r#"{"status":"success","data":[{"uid":"bk_123","start":"2025-01-10T15:00:00Z"}]}"#;

fn service_with(openai: Arc<dyn OpenAIClient>, api: Arc<FakeCalApi>) -> ChatService {
    ChatService::new(openai, BookingService::new(api, 3666489))
}

// Every output's correlation id must refer to a call appended earlier.
fn assert_outputs_pair_with_earlier_calls(log: &[ChatEntry]) {
    let mut seen_calls = Vec::new();
    for entry in log {
        match entry {
            ChatEntry::FunctionCall { call_id, .. } => seen_calls.push(call_id.clone()),
            ChatEntry::FunctionCallOutput { call_id, .. } => {
                assert!(
                    seen_calls.contains(call_id),
                    "output {} has no earlier call",
                    call_id
                );
            }
            _ => {}
        }
    }
}

#[tokio::test]
async fn plain_text_turn_ends_the_loop_without_tool_calls() {
    let openai = ScriptedOpenAI::scripted(vec![vec![assistant("Hello! How can I help?")]]);
    let api = FakeCalApi::new(ONE_BOOKING, "{}");
    let service = service_with(openai.clone(), api.clone());
    let mut session = Session::new("s1");

    let reply = service.handle_message(&mut session, "hi").await.unwrap();

    assert_eq!(reply, "Hello! How can I help?");
    assert!(api.calls().is_empty());
    assert_eq!(session.log.len(), 2);
    assert_eq!(openai.inputs().len(), 1);
}

#[tokio::test]
async fn cancel_scenario_runs_lookup_then_cancel_then_confirms() {
    let openai = ScriptedOpenAI::scripted(vec![
        vec![call(
            "cancel_first_booking",
            "call_1",
            json!({"attendeeEmail": "a@b.c", "scheduledStartTime": "2025-01-10T15:00:00Z"}),
        )],
        vec![assistant("Your 3pm booking on 2025-01-10 has been cancelled.")],
    ]);
    let api = FakeCalApi::new(ONE_BOOKING, r#"{"status":"success"}"#);
    let service = service_with(openai.clone(), api.clone());
    let mut session = Session::new("s1");

    let reply = service
        .handle_message(&mut session, "Cancel my 3pm booking on 2025-01-10")
        .await
        .unwrap();

    assert_eq!(reply, "Your 3pm booking on 2025-01-10 has been cancelled.");
    assert_eq!(api.calls(), vec!["get".to_string(), "cancel bk_123".to_string()]);
    assert_outputs_pair_with_earlier_calls(&session.log);

    // The second model turn must already see the tool output.
    let inputs = openai.inputs();
    assert_eq!(inputs.len(), 2);
    assert!(inputs[1].iter().any(|entry| matches!(
        entry,
        ChatEntry::FunctionCallOutput { call_id, .. } if call_id == "call_1"
    )));
}

#[tokio::test]
async fn calls_in_one_turn_run_sequentially_in_listed_order() {
    let openai = ScriptedOpenAI::scripted(vec![
        vec![
            call(
                "list_all_upcoming_bookings",
                "call_1",
                json!({"attendeeEmail": "a@b.c"}),
            ),
            call(
                "look_up_first_booking",
                "call_2",
                json!({"attendeeEmail": "a@b.c", "scheduledStartTime": "2025-01-10T15:00:00Z"}),
            ),
        ],
        vec![assistant("Found them.")],
    ]);
    let api = FakeCalApi::new(ONE_BOOKING, "{}");
    let service = service_with(openai, api.clone());
    let mut session = Session::new("s1");

    service.handle_message(&mut session, "what do I have?").await.unwrap();

    assert_eq!(api.calls(), vec!["get".to_string(), "get".to_string()]);
    let output_ids: Vec<&str> = session
        .log
        .iter()
        .filter_map(|entry| match entry {
            ChatEntry::FunctionCallOutput { call_id, .. } => Some(call_id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(output_ids, vec!["call_1", "call_2"]);
    assert_outputs_pair_with_earlier_calls(&session.log);
}

#[tokio::test]
async fn unknown_tool_name_gets_a_fallback_output() {
    let openai = ScriptedOpenAI::scripted(vec![
        vec![call("delete_all_bookings", "call_1", json!({}))],
        vec![assistant("Sorry, I can't do that.")],
    ]);
    let api = FakeCalApi::new(ONE_BOOKING, "{}");
    let service = service_with(openai, api.clone());
    let mut session = Session::new("s1");

    let reply = service
        .handle_message(&mut session, "wipe everything")
        .await
        .unwrap();

    assert_eq!(reply, "Sorry, I can't do that.");
    assert!(api.calls().is_empty());
    let output = session
        .log
        .iter()
        .find_map(|entry| match entry {
            ChatEntry::FunctionCallOutput { call_id, output } if call_id == "call_1" => {
                Some(output.clone())
            }
            _ => None,
        })
        .expect("unknown tool must still produce an output entry");
    let payload: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(payload["error"], "unknown function: delete_all_bookings");
}

#[tokio::test]
async fn malformed_arguments_get_a_fallback_output() {
    let openai = ScriptedOpenAI::scripted(vec![
        vec![ChatEntry::FunctionCall {
            id: None,
            name: "create_booking".to_string(),
            arguments: "{not json".to_string(),
            call_id: "call_1".to_string(),
        }],
        vec![assistant("I couldn't read that, let's try again.")],
    ]);
    let api = FakeCalApi::new(ONE_BOOKING, "{}");
    let service = service_with(openai, api.clone());
    let mut session = Session::new("s1");

    let reply = service.handle_message(&mut session, "book it").await.unwrap();

    assert_eq!(reply, "I couldn't read that, let's try again.");
    assert!(api.calls().is_empty());
    assert_outputs_pair_with_earlier_calls(&session.log);
    let has_error_output = session.log.iter().any(|entry| matches!(
        entry,
        ChatEntry::FunctionCallOutput { call_id, output }
            if call_id == "call_1" && output.contains("invalid arguments for create_booking")
    ));
    assert!(has_error_output);
}

#[tokio::test]
async fn runaway_tool_calls_hit_the_pass_limit() {
    let openai = Arc::new(AlwaysCallsOpenAI {
        turns_served: StdMutex::new(0),
    });
    let api = FakeCalApi::new(ONE_BOOKING, "{}");
    let service = service_with(openai.clone(), api);
    let mut session = Session::new("s1");

    let result = service.handle_message(&mut session, "list forever").await;

    assert!(matches!(result, Err(BotError::ToolLoopLimit(limit)) if limit == MAX_TOOL_PASSES));
    assert_eq!(*openai.turns_served.lock().unwrap(), MAX_TOOL_PASSES);
}
