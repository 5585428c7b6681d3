//! Telemetry context
//!
//! Built once at process start and passed by reference to the tool
//! registry and the transport client.

use serde::Serialize;
use tracing::Span;

const DEFAULT_SERVICE_NAME: &str = "cmop-observer";
const DEFAULT_MAX_PAYLOAD_CHARS: usize = 4000;

#[derive(Debug, Clone)]
pub struct Telemetry {
    service_name: String,
    max_payload_chars: usize,
}

impl Telemetry {
    pub fn new(service_name: impl Into<String>, max_payload_chars: usize) -> Self {
        Self {
            service_name: service_name.into(),
            max_payload_chars,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Span wrapping one tool dispatch
    pub fn tool_span(&self, tool: &str) -> Span {
        tracing::info_span!("tool", service = %self.service_name, tool = %tool)
    }

    /// Span wrapping one transport request
    pub fn http_span(&self, path: &str) -> Span {
        tracing::debug_span!("http", service = %self.service_name, path = %path)
    }

    /// JSON text of `data`, cut to the configured length for log fields
    pub fn truncate_json<T: Serialize + ?Sized>(&self, data: &T) -> String {
        let text = serde_json::to_string(data).unwrap_or_else(|_| "<unserializable>".to_string());
        self.truncate(&text)
    }

    pub fn truncate(&self, text: &str) -> String {
        let total = text.chars().count();
        if total <= self.max_payload_chars {
            return text.to_string();
        }
        let head: String = text.chars().take(self.max_payload_chars).collect();
        format!("{}... [truncated, total {} chars]", head, total)
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_NAME, DEFAULT_MAX_PAYLOAD_CHARS)
    }
}
