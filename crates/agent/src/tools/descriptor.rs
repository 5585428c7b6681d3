//! Tool descriptors
//!
//! Each tool declares its parameters statically; the registry turns that
//! declaration plus the tool's doc text into an OpenAI function schema once,
//! at registration time.

use cmop_common::ClosedEnum;
use cmop_provider::Tool;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// Semantic parameter type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamType {
    Integer,
    Number,
    Boolean,
    String,
    /// String constrained to a closed set of values
    Enum(&'static [&'static str]),
}

impl ParamType {
    /// Enumerated string backed by a [`ClosedEnum`]
    pub fn of<T: ClosedEnum>() -> Self {
        ParamType::Enum(T::allowed_values())
    }

    fn to_schema(self) -> Map<String, Value> {
        let mut prop = Map::new();
        let ty = match self {
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::String | ParamType::Enum(_) => "string",
        };
        prop.insert("type".to_string(), json!(ty));
        if let ParamType::Enum(values) = self {
            prop.insert("enum".to_string(), json!(values));
        }
        prop
    }
}

/// How a parameter behaves when the caller leaves it out
#[derive(Debug, Clone, PartialEq)]
pub enum ParamDefault {
    Required,
    /// Optional, with the default shown to the model
    Value(Value),
    /// Optional, with no default value
    NoValue,
}

/// Statically declared parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub default: ParamDefault,
}

impl ParamSpec {
    pub fn required(name: &'static str, ty: ParamType) -> Self {
        Self {
            name,
            ty,
            default: ParamDefault::Required,
        }
    }

    pub fn optional(name: &'static str, ty: ParamType, default: impl Into<Value>) -> Self {
        Self {
            name,
            ty,
            default: ParamDefault::Value(default.into()),
        }
    }

    pub fn nullable(name: &'static str, ty: ParamType) -> Self {
        Self {
            name,
            ty,
            default: ParamDefault::NoValue,
        }
    }
}

/// Resolved parameter as presented to the model
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
    pub name: String,
    pub ty: ParamType,
    pub required: bool,
    pub default: Option<Value>,
    pub description: String,
}

/// Machine-readable description of one tool. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    params: Vec<ParamDescriptor>,
}

impl ToolDescriptor {
    /// Build from a tool name, its doc text and its declared parameters
    pub fn build(name: &str, doc: &str, params: &[ParamSpec]) -> Self {
        let arg_docs = parse_args_block(doc);

        let params = params
            .iter()
            .map(|spec| ParamDescriptor {
                name: spec.name.to_string(),
                ty: spec.ty,
                required: spec.default == ParamDefault::Required,
                default: match &spec.default {
                    ParamDefault::Value(v) if !v.is_null() => Some(v.clone()),
                    _ => None,
                },
                description: arg_docs
                    .get(spec.name)
                    .cloned()
                    .unwrap_or_else(|| spec.name.to_string()),
            })
            .collect();

        let description = doc
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or(name)
            .to_string();

        Self {
            name: name.to_string(),
            description,
            params,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    pub fn required(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// JSON schema of the parameter object
    pub fn parameters_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.params {
            let mut prop = param.ty.to_schema();
            prop.insert("description".to_string(), json!(param.description));
            if let Some(default) = &param.default {
                prop.insert("default".to_string(), default.clone());
            }
            properties.insert(param.name.clone(), Value::Object(prop));
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required(),
        })
    }

    /// Provider-facing function definition
    pub fn to_tool(&self) -> Tool {
        Tool::new(&self.name, &self.description, self.parameters_schema())
    }
}

/// Extract `name: description` lines from an `Args:` block.
///
/// Never fails; text it cannot read yields no entries.
pub fn parse_args_block(doc: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let Ok(entry) = Regex::new(r"^-?\s*([A-Za-z_][A-Za-z0-9_]*)\s*:\s*(.*)$") else {
        return params;
    };

    let mut in_args = false;
    for line in doc.lines() {
        let stripped = line.trim();
        if stripped.to_ascii_lowercase().starts_with("args:") {
            in_args = true;
            continue;
        }
        if !in_args || stripped.is_empty() {
            continue;
        }

        match entry.captures(stripped) {
            Some(caps) if !caps[2].is_empty() => {
                params.insert(caps[1].to_string(), caps[2].trim().to_string());
            }
            // a bare `Returns:` style header closes the block
            Some(_) => break,
            None if stripped.starts_with('-') => continue,
            None => break,
        }
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmop_common::TriageColor;

    const DOC: &str = "Find entities within radius of coordinates.

Args:
    longitude: WGS84 longitude.
    latitude: WGS84 latitude.
    - radius_m: Search radius in meters (default 5000).
";

    fn nearby() -> ToolDescriptor {
        ToolDescriptor::build(
            "get_nearby_entities",
            DOC,
            &[
                ParamSpec::required("longitude", ParamType::Number),
                ParamSpec::required("latitude", ParamType::Number),
                ParamSpec::optional("radius_m", ParamType::Integer, 5000),
            ],
        )
    }

    #[test]
    fn test_summary_is_first_doc_line() {
        assert_eq!(
            nearby().description(),
            "Find entities within radius of coordinates."
        );
    }

    #[test]
    fn test_summary_falls_back_to_name() {
        let descriptor = ToolDescriptor::build("get_schema", "", &[]);
        assert_eq!(descriptor.description(), "get_schema");
    }

    #[test]
    fn test_required_and_defaults() {
        let schema = nearby().parameters_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["longitude", "latitude"]));
        assert_eq!(schema["properties"]["radius_m"]["default"], 5000);
        assert_eq!(schema["properties"]["radius_m"]["type"], "integer");
        assert!(schema["properties"]["longitude"].get("default").is_none());
    }

    #[test]
    fn test_descriptions_from_args_block() {
        let schema = nearby().parameters_schema();
        assert_eq!(
            schema["properties"]["latitude"]["description"],
            "WGS84 latitude."
        );
        assert_eq!(
            schema["properties"]["radius_m"]["description"],
            "Search radius in meters (default 5000)."
        );
    }

    #[test]
    fn test_undocumented_param_uses_name() {
        let descriptor = ToolDescriptor::build(
            "get_entity_by_id",
            "Get single entity by numeric ID.",
            &[ParamSpec::required("entity_id", ParamType::Integer)],
        );
        let schema = descriptor.parameters_schema();
        assert_eq!(schema["properties"]["entity_id"]["description"], "entity_id");
    }

    #[test]
    fn test_no_value_default_is_optional_without_default_key() {
        let descriptor = ToolDescriptor::build(
            "t",
            "",
            &[
                ParamSpec::nullable("note", ParamType::String),
                ParamSpec::optional("flag", ParamType::Boolean, Value::Null),
            ],
        );
        let schema = descriptor.parameters_schema();
        assert_eq!(schema["required"], json!([]));
        assert!(schema["properties"]["note"].get("default").is_none());
        assert!(schema["properties"]["flag"].get("default").is_none());
    }

    #[test]
    fn test_enum_param() {
        let descriptor = ToolDescriptor::build(
            "get_casualties_by_triage",
            "",
            &[ParamSpec::required("color", ParamType::of::<TriageColor>())],
        );
        let prop = &descriptor.parameters_schema()["properties"]["color"];
        assert_eq!(prop["type"], "string");
        assert_eq!(
            prop["enum"],
            json!(["RED", "YELLOW", "GREEN", "BLUE", "BLACK", "UNKNOWN"])
        );
    }

    #[test]
    fn test_args_block_stops_at_prose() {
        let doc = "Summary.\n\nArgs:\n    a: first\n\nThat is all there is\n    b: not a parameter\n";
        let parsed = parse_args_block(doc);
        assert_eq!(parsed.get("a").map(String::as_str), Some("first"));
        assert!(!parsed.contains_key("b"));
    }

    #[test]
    fn test_args_block_stops_at_header() {
        let doc = "Args:\n    a: first\nReturns:\n    b: envelope\n";
        let parsed = parse_args_block(doc);
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_malformed_doc_never_fails() {
        assert!(parse_args_block("Args:\n:::\n---").is_empty());
        assert!(parse_args_block("no block here: at all").is_empty());
    }

    #[test]
    fn test_to_tool() {
        let tool = nearby().to_tool();
        assert_eq!(tool.tool_type, "function");
        assert_eq!(tool.function.name, "get_nearby_entities");
        assert_eq!(tool.function.parameters["properties"]["longitude"]["type"], "number");
    }
}
