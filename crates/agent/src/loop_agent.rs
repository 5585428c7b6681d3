//! Agent session: the Think → Act → Reflect loop

use serde_json::Value;
use tracing::{debug, info, warn};

use cmop_client::CmopApi;
use cmop_common::{Envelope, ErrorKind};
use cmop_config::Config;
use cmop_provider::{ChatParams, Message, Provider, ToolCall, ToolChoice};

use crate::context::ContextBuilder;
use crate::tools::{DoneTool, TerminationSignal, ToolRegistry};

/// Returned when the iteration cap runs out before the model finishes
pub const INCOMPLETE_ANALYSIS: &str = "⚠️ Analysis incomplete — agent exceeded iteration limit.";

/// Message recorded for calls dropped after `done`
const SKIPPED_AFTER_DONE: &str = "Skipped: analysis already complete.";

type ToolCallHook = Box<dyn Fn(&ToolCall) + Send + Sync>;

/// One conversation with the model.
///
/// Owns the append-only history. Serves a single observation run or many
/// interactive turns.
pub struct AgentSession<P: Provider> {
    provider: P,
    tools: ToolRegistry,
    signal: TerminationSignal,
    model: String,
    max_iterations: u32,
    max_tokens: u32,
    temperature: f32,
    history: Vec<Message>,
    on_tool_call: Option<ToolCallHook>,
}

impl<P: Provider> AgentSession<P> {
    /// Create a session; registers `done` bound to the session's signal
    pub fn new(
        provider: P,
        mut tools: ToolRegistry,
        config: &Config,
        system_prompt: impl Into<String>,
    ) -> Self {
        let signal = TerminationSignal::new();
        tools.register(DoneTool::new(signal.clone()));

        Self {
            provider,
            tools,
            signal,
            model: config.model(),
            max_iterations: config.max_iterations(),
            max_tokens: config.llm.max_tokens,
            temperature: config.llm.temperature,
            history: vec![Message::system(system_prompt)],
            on_tool_call: None,
        }
    }

    /// Callback fired before each tool dispatch
    pub fn on_tool_call<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ToolCall) + Send + Sync + 'static,
    {
        self.on_tool_call = Some(Box::new(hook));
        self
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn signal(&self) -> &TerminationSignal {
        &self.signal
    }

    /// Fetch the CMOP schema once and log how many categories it lists.
    ///
    /// Returns the category count; a failed load is logged and yields `None`.
    pub async fn load_schema(&self, api: &dyn CmopApi) -> Option<usize> {
        info!("Loading CMOP schema...");
        let result = api.get_schema().await;

        match result.data() {
            Some(schema) if result.is_success() => {
                let categories = schema
                    .get("categories")
                    .and_then(|c| c.as_array())
                    .map_or(0, Vec::len);
                info!("Schema loaded: {} categories available", categories);
                Some(categories)
            }
            _ => {
                warn!(
                    "Schema load failed: {}",
                    result.message_text().unwrap_or("no data")
                );
                None
            }
        }
    }

    /// Run one user request to a terminal answer
    pub async fn run(&mut self, user_prompt: &str) -> crate::Result<String> {
        self.signal.reset();
        self.history.push(Message::user(user_prompt));

        for iteration in 1..=self.max_iterations {
            debug!("Iteration {}/{}", iteration, self.max_iterations);

            // Think
            let params = ChatParams {
                model: self.model.clone(),
                messages: self.history.clone(),
                tools: self.tools.definitions(),
                max_tokens: self.max_tokens,
                temperature: self.temperature,
                tool_choice: ToolChoice::Auto,
            };
            let response = self.provider.chat(params).await?;

            self.history.push(response.to_message());

            if !response.has_tool_calls() {
                return Ok(response.content.unwrap_or_default());
            }

            // Act, then Reflect
            let mut calls = response.tool_calls.iter();
            while let Some(call) = calls.next() {
                if let Some(hook) = &self.on_tool_call {
                    hook(call);
                }

                let envelope = match self.tools.execute(&call.name, call.arguments.clone()).await
                {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        // answer this call and the rest of the batch before aborting
                        let aborted = Envelope::<Value>::fail(
                            ErrorKind::ToolExecutionError,
                            format!("Run aborted: {}", e),
                        )
                        .to_json_string();
                        for unanswered in std::iter::once(call).chain(calls) {
                            ContextBuilder::add_tool_result(
                                &mut self.history,
                                &unanswered.id,
                                &unanswered.name,
                                &aborted,
                            );
                        }
                        return Err(e);
                    }
                };
                ContextBuilder::add_tool_result(
                    &mut self.history,
                    &call.id,
                    &call.name,
                    &envelope.to_json_string(),
                );

                if let Some(summary) = self.signal.get() {
                    info!("Agent signalled done at iteration {}", iteration);
                    let skipped_result =
                        Envelope::<Value>::message(SKIPPED_AFTER_DONE).to_json_string();
                    for skipped in calls {
                        debug!("Skipping {} after done", skipped.name);
                        ContextBuilder::add_tool_result(
                            &mut self.history,
                            &skipped.id,
                            &skipped.name,
                            &skipped_result,
                        );
                    }
                    return Ok(summary);
                }
            }
        }

        warn!("Agent exceeded max iterations ({})", self.max_iterations);
        Ok(INCOMPLETE_ANALYSIS.to_string())
    }
}
