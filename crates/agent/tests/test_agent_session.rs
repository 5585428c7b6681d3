//! Tests for the agent session loop

use async_trait::async_trait;
use cmop_agent::tools::{parse_args, ParamSpec, ToolError};
use cmop_agent::{AgentError, AgentSession, ToolRegistry, ToolTrait, INCOMPLETE_ANALYSIS};
use cmop_client::CmopApi;
use cmop_common::{Envelope, ErrorKind};
use cmop_config::Config;
use cmop_provider::{
    ChatParams, ChatResponse, Message, Provider, ProviderError, Result as ProviderResult, Role,
    ToolCall,
};
use mockall::mock;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Replays canned responses and records every request
#[derive(Clone, Default)]
struct ScriptedProvider {
    responses: Arc<Mutex<VecDeque<ProviderResult<ChatResponse>>>>,
    requests: Arc<Mutex<Vec<ChatParams>>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<ProviderResult<ChatResponse>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            requests: Arc::default(),
        }
    }

    fn requests(&self) -> Vec<ChatParams> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn chat(&self, params: ChatParams) -> ProviderResult<ChatResponse> {
        self.requests.lock().unwrap().push(params);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ChatResponse::text("script exhausted")))
    }

    fn default_model(&self) -> String {
        "scripted".to_string()
    }

    fn is_configured(&self) -> bool {
        true
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

/// Counts invocations; takes no arguments
struct ProbeTool {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ToolTrait for ProbeTool {
    fn name(&self) -> &str {
        "probe"
    }

    fn doc(&self) -> &str {
        "Probe the picture."
    }

    fn params(&self) -> Vec<ParamSpec> {
        Vec::new()
    }

    async fn execute(&self, args: Value) -> Result<Envelope, ToolError> {
        parse_args::<NoArgs>(args)?;
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Envelope::ok(json!({ "probe": n })))
    }
}

fn tool_turn(calls: &[(&str, &str, Value)]) -> ProviderResult<ChatResponse> {
    let calls = calls
        .iter()
        .map(|(id, name, args)| ToolCall::new(*id, *name, args.clone()))
        .collect();
    Ok(ChatResponse::with_tool_calls(None, calls))
}

fn config(max_iterations: u32) -> Config {
    let mut config = Config::default();
    config.agent.max_iterations = max_iterations;
    config
}

fn session(
    provider: ScriptedProvider,
    max_iterations: u32,
) -> (AgentSession<ScriptedProvider>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = ToolRegistry::default();
    registry.register(ProbeTool {
        calls: calls.clone(),
    });
    let session = AgentSession::new(provider, registry, &config(max_iterations), "system prompt");
    (session, calls)
}

/// Every tool call id in an assistant turn is answered, in order, by the
/// `tool` messages directly after it
fn assert_well_formed(history: &[Message]) {
    let mut i = 0;
    while i < history.len() {
        let message = &history[i];
        if message.role == Role::Assistant {
            if let Some(calls) = &message.tool_calls {
                for (offset, call) in calls.iter().enumerate() {
                    let reply = &history[i + 1 + offset];
                    assert_eq!(reply.role, Role::Tool);
                    assert_eq!(reply.tool_call_id.as_deref(), Some(call.id.as_str()));
                }
                i += calls.len();
            }
        }
        i += 1;
    }
}

#[tokio::test]
async fn test_session_registers_done() {
    let (session, _) = session(ScriptedProvider::default(), 5);
    assert!(session.tools().has("done"));
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.history()[0].role, Role::System);
}

#[tokio::test]
async fn test_plain_answer_on_first_turn() {
    let provider = ScriptedProvider::new(vec![Ok(ChatResponse::text("All quiet."))]);
    let (mut session, calls) = session(provider.clone(), 5);

    let answer = session.run("Status?").await.unwrap();
    assert_eq!(answer, "All quiet.");
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let history = session.history();
    assert_eq!(history.len(), 3);
    assert_eq!(history[1].role, Role::User);
    assert_eq!(history[2].role, Role::Assistant);

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    let offered: Vec<&str> = requests[0]
        .tools
        .iter()
        .map(|t| t.function.name.as_str())
        .collect();
    assert_eq!(offered, vec!["probe", "done"]);
}

#[tokio::test]
async fn test_done_on_third_turn_returns_summary() {
    let provider = ScriptedProvider::new(vec![
        tool_turn(&[("c1", "probe", json!({}))]),
        tool_turn(&[("c2", "probe", json!({}))]),
        tool_turn(&[("c3", "done", json!({"summary": "X"}))]),
    ]);
    let (mut session, calls) = session(provider.clone(), 10);

    let answer = session.run("Analyze").await.unwrap();
    assert_eq!(answer, "X");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(provider.requests().len(), 3);
    assert!(session.signal().is_set());
    assert_well_formed(session.history());

    // the second request sees the first tool result
    let requests = provider.requests();
    let last = requests[1].messages.last().unwrap();
    assert_eq!(last.role, Role::Tool);
    assert_eq!(last.tool_call_id.as_deref(), Some("c1"));
    assert!(last.text().contains("\"probe\":1"));
}

#[tokio::test]
async fn test_calls_after_done_are_skipped() {
    let provider = ScriptedProvider::new(vec![tool_turn(&[
        ("c1", "probe", json!({})),
        ("c2", "done", json!({"summary": "Finished"})),
        ("c3", "probe", json!({})),
    ])]);
    let (mut session, calls) = session(provider, 10);

    let answer = session.run("Analyze").await.unwrap();
    assert_eq!(answer, "Finished");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let history = session.history();
    assert_well_formed(history);
    let skipped = history.last().unwrap();
    assert_eq!(skipped.tool_call_id.as_deref(), Some("c3"));
    assert!(skipped.text().contains("Skipped"));
}

#[tokio::test]
async fn test_iteration_cap() {
    let turns = (0..3)
        .map(|i| {
            let id = format!("c{}", i);
            tool_turn(&[(id.as_str(), "probe", json!({}))])
        })
        .collect();
    let provider = ScriptedProvider::new(turns);
    let (mut session, calls) = session(provider.clone(), 3);

    let answer = session.run("Analyze").await.unwrap();
    assert_eq!(answer, INCOMPLETE_ANALYSIS);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(provider.requests().len(), 3);
    assert_well_formed(session.history());
}

#[tokio::test]
async fn test_tool_failure_is_fed_back() {
    let provider = ScriptedProvider::new(vec![
        tool_turn(&[("c1", "probe", json!({"bogus": true}))]),
        Ok(ChatResponse::text("Corrected.")),
    ]);
    let (mut session, _) = session(provider.clone(), 5);

    let answer = session.run("Analyze").await.unwrap();
    assert_eq!(answer, "Corrected.");

    let fed_back = provider.requests()[1].messages.last().unwrap().clone();
    let envelope: Value = serde_json::from_str(fed_back.text()).unwrap();
    assert_eq!(envelope["success"], false);
    assert_eq!(envelope["error"], "INVALID_ARGUMENTS");
    assert_eq!(envelope["action"], "correct");
}

#[tokio::test]
async fn test_unknown_tool_aborts_run() {
    let provider = ScriptedProvider::new(vec![tool_turn(&[
        ("c1", "probe", json!({})),
        ("c2", "teleport", json!({})),
        ("c3", "probe", json!({})),
    ])]);
    let (mut session, calls) = session(provider, 5);

    let err = session.run("Analyze").await.unwrap_err();
    assert!(matches!(err, AgentError::UnknownTool { ref name, .. } if name == "teleport"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // system, user, assistant, then one reply per call
    let history = session.history();
    assert_eq!(history.len(), 6);
    assert_eq!(history[2].role, Role::Assistant);
    assert_well_formed(history);

    assert_eq!(history[3].tool_call_id.as_deref(), Some("c1"));
    assert!(history[3].text().contains("\"probe\":1"));
    for aborted in &history[4..] {
        let envelope: Value = serde_json::from_str(aborted.text()).unwrap();
        assert_eq!(envelope["success"], false);
        assert_eq!(envelope["error"], "TOOL_EXECUTION_ERROR");
    }
}

#[tokio::test]
async fn test_provider_error_propagates() {
    let provider =
        ScriptedProvider::new(vec![Err(ProviderError::Api("model overloaded".to_string()))]);
    let (mut session, _) = session(provider, 5);

    let err = session.run("Analyze").await.unwrap_err();
    assert!(matches!(err, AgentError::Provider(ProviderError::Api(_))));
}

#[tokio::test]
async fn test_history_grows_across_turns() {
    let provider = ScriptedProvider::new(vec![
        tool_turn(&[("c1", "done", json!({"summary": "first"}))]),
        tool_turn(&[("c2", "done", json!({"summary": "second"}))]),
    ]);
    let (mut session, _) = session(provider.clone(), 5);

    assert_eq!(session.run("one").await.unwrap(), "first");
    assert_eq!(session.run("two").await.unwrap(), "second");

    let history = session.history();
    let users: Vec<&str> = history
        .iter()
        .filter(|m| m.role == Role::User)
        .map(|m| m.text())
        .collect();
    assert_eq!(users, vec!["one", "two"]);
    // system, one, assistant, tool, two
    assert_eq!(provider.requests()[1].messages.len(), 5);
}

#[tokio::test]
async fn test_on_tool_call_hook() {
    let provider = ScriptedProvider::new(vec![
        tool_turn(&[("c1", "probe", json!({}))]),
        Ok(ChatResponse::text("done")),
    ]);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let (session, _) = session(provider, 5);
    let mut session = session.on_tool_call(move |call| {
        sink.lock().unwrap().push(call.name.clone());
    });

    session.run("Analyze").await.unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["probe".to_string()]);
}

mock! {
    pub Api {}

    #[async_trait]
    impl CmopApi for Api {
        async fn get_entities(&self) -> Envelope;
        async fn get_entity(&self, entity_id: i64) -> Envelope;
        async fn get_entities_by_category(&self, category: &str) -> Envelope;
        async fn get_nearby_entities(&self, longitude: f64, latitude: f64, radius_m: i64) -> Envelope;
        async fn get_casualties(&self) -> Envelope;
        async fn get_casualties_by_triage(&self, color: &str) -> Envelope;
        async fn get_casualties_by_evac_stage(&self, stage: &str) -> Envelope;
        async fn get_nine_line(&self, entity_id: i64) -> Envelope;
        async fn get_schema(&self) -> Envelope;
        async fn get_scenarios(&self) -> Envelope;
    }
}

#[tokio::test]
async fn test_load_schema_counts_categories() {
    let mut api = MockApi::new();
    api.expect_get_schema()
        .times(1)
        .returning(|| Envelope::ok(json!({"categories": ["casualty", "medical_facility", "infantry"]})));

    let (session, _) = session(ScriptedProvider::default(), 5);
    assert_eq!(session.load_schema(&api).await, Some(3));
}

#[tokio::test]
async fn test_load_schema_failure_is_not_fatal() {
    let mut api = MockApi::new();
    api.expect_get_schema()
        .returning(|| Envelope::fail(ErrorKind::ConnectionRefused, "Cannot connect"));

    let (session, _) = session(ScriptedProvider::default(), 5);
    assert_eq!(session.load_schema(&api).await, None);
}
