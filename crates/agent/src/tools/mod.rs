//! Tool registry
//!
//! Owns the named tools and their descriptors, and dispatches model-issued
//! calls back into them. Tool faults become envelopes here; only an unknown
//! tool name escapes as an error.

pub mod basic;
pub mod descriptor;
pub mod done;
pub mod medical;

pub use basic::register_basic_tools;
pub use descriptor::{ParamDefault, ParamDescriptor, ParamSpec, ParamType, ToolDescriptor};
pub use done::{DoneTool, TerminationSignal};
pub use medical::register_medical_tools;

use async_trait::async_trait;
use cmop_common::{ClosedEnum, Envelope, ErrorKind, Telemetry};
use cmop_provider::Tool;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn, Instrument};

use crate::AgentError;
use cmop_client::CmopApi;

/// Why a tool could not produce its own envelope
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Execution(String),
}

#[async_trait]
pub trait ToolTrait: Send + Sync {
    fn name(&self) -> &str;
    /// Doc text: summary line, then an optional `Args:` block
    fn doc(&self) -> &str;
    fn params(&self) -> Vec<ParamSpec>;
    async fn execute(&self, args: Value) -> Result<Envelope, ToolError>;
}

type BoxedTool = Box<dyn ToolTrait>;

/// Bind a JSON argument object onto a typed argument struct
pub fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    let args = match args {
        Value::Null => Value::Object(Default::default()),
        Value::Object(_) => args,
        other => {
            return Err(ToolError::InvalidArguments(format!(
                "arguments must be a JSON object, got {}",
                other
            )))
        }
    };
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Strictly parse an enumerated argument
pub fn parse_enum<T: ClosedEnum>(field: &str, value: &str) -> Result<T, ToolError> {
    T::parse(value).ok_or_else(|| {
        ToolError::InvalidArguments(format!(
            "{} must be one of {}, got '{}'",
            field,
            T::allowed_values().join(", "),
            value
        ))
    })
}

struct Entry {
    tool: BoxedTool,
    descriptor: ToolDescriptor,
}

/// Named tools in registration order
pub struct ToolRegistry {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
    telemetry: Telemetry,
}

impl ToolRegistry {
    pub fn new(telemetry: Telemetry) -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            telemetry,
        }
    }

    /// Install a tool; an existing binding of the same name is replaced in place
    pub fn register<T: ToolTrait + 'static>(&mut self, tool: T) {
        let descriptor = ToolDescriptor::build(tool.name(), tool.doc(), &tool.params());
        let name = descriptor.name().to_string();
        let entry = Entry {
            tool: Box::new(tool),
            descriptor,
        };

        match self.index.get(&name) {
            Some(&pos) => {
                warn!("Tool '{}' already registered, overwriting.", name);
                self.entries[pos] = entry;
            }
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
        debug!("Registered tool: {}", name);
    }

    pub fn get(&self, name: &str) -> Option<&dyn ToolTrait> {
        self.index
            .get(name)
            .map(|&pos| self.entries[pos].tool.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.descriptor.name().to_string())
            .collect()
    }

    /// Descriptor snapshot in registration order
    pub fn schemas(&self) -> Vec<ToolDescriptor> {
        self.entries.iter().map(|e| e.descriptor.clone()).collect()
    }

    /// Function definitions for the language model
    pub fn definitions(&self) -> Vec<Tool> {
        self.entries.iter().map(|e| e.descriptor.to_tool()).collect()
    }

    /// Run a tool by name.
    ///
    /// Argument binding failures and tool faults come back as failure
    /// envelopes; an unregistered name is an error.
    pub async fn execute(&self, name: &str, args: Value) -> Result<Envelope, AgentError> {
        let Some(&pos) = self.index.get(name) else {
            return Err(AgentError::UnknownTool {
                name: name.to_string(),
                available: self.names().join(", "),
            });
        };
        let tool = &self.entries[pos].tool;

        let span = self.telemetry.tool_span(name);
        async {
            info!("Executing tool: {}({})", name, self.telemetry.truncate_json(&args));

            let envelope = match tool.execute(args).await {
                Ok(envelope) => envelope,
                Err(ToolError::InvalidArguments(detail)) => Envelope::fail(
                    ErrorKind::InvalidArguments,
                    format!("Tool '{}' received invalid arguments: {}", name, detail),
                ),
                Err(ToolError::Execution(detail)) => {
                    error!("Tool '{}' failed: {}", name, detail);
                    Envelope::fail(
                        ErrorKind::ToolExecutionError,
                        format!("Tool '{}' failed: {}", name, detail),
                    )
                }
            };

            debug!(
                success = envelope.is_success(),
                "Tool result: {}",
                self.telemetry.truncate_json(&envelope)
            );
            Ok(envelope)
        }
        .instrument(span)
        .await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new(Telemetry::default())
    }
}

/// Register every CMOP query and analysis tool against one API client
pub fn register_cmop_tools(registry: &mut ToolRegistry, api: Arc<dyn CmopApi>) {
    register_basic_tools(registry, api.clone());
    register_medical_tools(registry, api);
}
