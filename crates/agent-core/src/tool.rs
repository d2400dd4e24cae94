//! Tool System
//!
//! Declarative tool schemas plus a name-keyed dispatch table. Every call is
//! validated against the tool's schema before the tool body runs, so tool
//! implementations only deal with well-typed arguments.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::error::{AgentError, Result};

/// Tool call request from the LLM
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation id linking this call to its result
    pub id: String,

    /// Tool identifier
    pub name: String,

    /// Arguments, expected to be a JSON object
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Raw argument value; `null` counts as absent
    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name).filter(|v| !v.is_null())
    }

    /// Required string argument
    pub fn str_arg(&self, name: &str) -> Result<&str> {
        self.argument(name)
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::invalid_argument(&self.name, name, "is required"))
    }

    pub fn optional_str(&self, name: &str) -> Option<&str> {
        self.argument(name).and_then(Value::as_str)
    }

    pub fn optional_f64(&self, name: &str) -> Option<f64> {
        self.argument(name).and_then(Value::as_f64)
    }

    pub fn optional_u64(&self, name: &str) -> Option<u64> {
        self.argument(name).and_then(Value::as_u64)
    }

    /// Successful result for this call
    pub fn success(&self, data: Value) -> ToolResult {
        ToolResult::success(&self.id, &self.name, data)
    }

    /// Failed result for this call
    pub fn failure(&self, reason: impl Into<String>) -> ToolResult {
        ToolResult::failure(&self.id, &self.name, reason)
    }
}

/// Result from tool execution
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Correlation id of the call this answers
    pub id: String,

    /// Tool that was called
    pub name: String,

    /// Whether execution succeeded
    pub success: bool,

    /// Serialized payload on success, failure reason otherwise
    pub output: String,

    /// Structured payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolResult {
    pub fn success(id: impl Into<String>, name: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            success: true,
            output: data.to_string(),
            data: Some(data),
        }
    }

    pub fn failure(id: impl Into<String>, name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            success: false,
            output: reason.into(),
            data: None,
        }
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, integer, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,

    /// Default value if not provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Enum of allowed values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
}

impl ParameterSchema {
    /// Required parameter
    pub fn required(name: &str, param_type: &str, description: &str) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: true,
            default: None,
            enum_values: None,
        }
    }

    /// Optional parameter
    pub fn optional(name: &str, param_type: &str, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }

    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub fn with_enum(mut self, values: &[&str]) -> Self {
        self.enum_values = Some(values.iter().map(|v| json!(v)).collect());
        self
    }

    fn accepts_type(&self, value: &Value) -> bool {
        match self.param_type.as_str() {
            "string" => value.is_string(),
            "number" => value.is_number(),
            "integer" => value.is_i64() || value.is_u64(),
            "boolean" => value.is_boolean(),
            "array" => value.is_array(),
            "object" => value.is_object(),
            _ => false,
        }
    }
}

const SUPPORTED_TYPES: [&str; 6] = ["string", "number", "integer", "boolean", "array", "object"];

/// Tool definition schema (for LLM function calling)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,

    /// Category for grouping
    #[serde(default)]
    pub category: Option<String>,
}

impl ToolSchema {
    /// JSON Schema object describing the arguments, as native tool-calling APIs expect
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            let mut property = json!({
                "type": param.param_type,
                "description": param.description,
            });
            if let Some(default) = &param.default {
                property["default"] = default.clone();
            }
            if let Some(values) = &param.enum_values {
                property["enum"] = Value::Array(values.clone());
            }
            properties.insert(param.name.clone(), property);
        }

        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Check the schema itself is well formed
    fn check(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AgentError::Config("Tool name must not be empty".into()));
        }

        let mut seen = HashSet::new();
        for param in &self.parameters {
            if !seen.insert(param.name.as_str()) {
                return Err(AgentError::Config(format!(
                    "Tool '{}' declares parameter '{}' twice",
                    self.name, param.name
                )));
            }
            if !SUPPORTED_TYPES.contains(&param.param_type.as_str()) {
                return Err(AgentError::Config(format!(
                    "Tool '{}' parameter '{}' has unsupported type '{}'",
                    self.name, param.name, param.param_type
                )));
            }
        }
        Ok(())
    }
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema for LLM function calling
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with already validated arguments
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult>;

    /// Validate arguments against the schema before execution
    fn validate(&self, call: &ToolCall) -> Result<()> {
        validate_arguments(&self.schema(), call)
    }
}

/// Check a call's arguments against a schema, naming the first offending field
pub fn validate_arguments(schema: &ToolSchema, call: &ToolCall) -> Result<()> {
    let invalid = |field: &str, reason: String| AgentError::invalid_argument(&schema.name, field, reason);

    let Some(arguments) = call.arguments.as_object() else {
        if call.arguments.is_null() && schema.parameters.iter().all(|p| !p.required) {
            return Ok(());
        }
        return Err(invalid("arguments", "must be a JSON object".into()));
    };

    for param in &schema.parameters {
        match arguments.get(&param.name).filter(|v| !v.is_null()) {
            None if param.required => return Err(invalid(&param.name, "is required".into())),
            None => {}
            Some(value) => {
                if !param.accepts_type(value) {
                    return Err(invalid(
                        &param.name,
                        format!("must be of type {}", param.param_type),
                    ));
                }
                if let Some(allowed) = &param.enum_values {
                    if !enum_allows(allowed, value) {
                        let options: Vec<String> = allowed.iter().map(ToString::to_string).collect();
                        return Err(invalid(
                            &param.name,
                            format!("must be one of {}", options.join(", ")),
                        ));
                    }
                }
            }
        }
    }

    if let Some(unknown) = arguments
        .keys()
        .find(|key| !schema.parameters.iter().any(|p| &p.name == *key))
    {
        return Err(invalid(unknown, "is not a recognised parameter".into()));
    }

    Ok(())
}

/// String enum values match regardless of case and surrounding whitespace
fn enum_allows(allowed: &[Value], value: &Value) -> bool {
    match value.as_str() {
        Some(text) => allowed
            .iter()
            .filter_map(Value::as_str)
            .any(|option| option.eq_ignore_ascii_case(text.trim())),
        None => allowed.contains(value),
    }
}

/// Registry for available tools
///
/// Keyed by name in a sorted map so descriptor listings are stable.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool, rejecting malformed schemas and duplicate names
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<()> {
        self.register_shared(Arc::new(tool))
    }

    /// Register an already shared tool
    pub fn register_shared(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let schema = tool.schema();
        schema.check()?;

        if self.tools.contains_key(&schema.name) {
            return Err(AgentError::Config(format!(
                "Tool '{}' is already registered",
                schema.name
            )));
        }

        self.tools.insert(schema.name, tool);
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Execute a tool call
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| AgentError::UnknownTool(call.name.clone()))?;

        tool.validate(call)?;

        tool.execute(call).await
    }

    /// Get all tool schemas, ordered by name
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| t.schema()).collect()
    }

    /// Get tool names, ordered
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Generate system prompt section describing available tools
    ///
    /// Used by providers without native tool calling.
    pub fn generate_prompt_section(&self) -> String {
        render_prompt_section(&self.schemas())
    }
}

/// Render tool schemas as a text block teaching the fenced `tool` call format
pub fn render_prompt_section(schemas: &[ToolSchema]) -> String {
    let mut prompt = String::from("## Available Tools\n\n");
    prompt.push_str("You can use the following tools by responding with one JSON block per call:\n\n");
    prompt.push_str("```tool\n{\"tool\": \"tool_name\", \"arguments\": {\"arg\": \"value\"}}\n```\n\n");

    for schema in schemas {
        prompt.push_str(&format!("### {}\n", schema.name));
        prompt.push_str(&format!("{}\n", schema.description));

        if !schema.parameters.is_empty() {
            prompt.push_str("**Parameters:**\n");
            for param in &schema.parameters {
                let required = if param.required { " (required)" } else { "" };
                prompt.push_str(&format!(
                    "- `{}` ({}){}: {}\n",
                    param.name, param.param_type, required, param.description
                ));
            }
        }
        prompt.push('\n');
    }

    prompt
}
