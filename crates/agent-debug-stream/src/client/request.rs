use std::fmt;
use std::str::FromStr;

use crate::errors::StreamError;

/// Endpoint for authenticated agent debug runs.
pub const DEBUG_AGENT_PATH: &str = "/agent/debug";
/// Endpoint for public (API key) agent runs.
pub const PUBLIC_RUN_PATH: &str = "/agent/run";

/// Agent topology being debugged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    #[default]
    Single,
    Workflow,
    Supervisor,
}

impl AgentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Workflow => "workflow",
            Self::Supervisor => "supervisor",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = StreamError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "workflow" => Ok(Self::Workflow),
            "supervisor" => Ok(Self::Supervisor),
            other => Err(StreamError::Validation(format!(
                "unknown agent type: {other} (expected single, workflow or supervisor)"
            ))),
        }
    }
}

/// Run configuration forwarded to the agent runtime.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RunnableConfig {
    pub thread_id: String,
}

/// Body of a debug run request.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DebugAgentRequest {
    #[serde(rename = "type")]
    pub agent_type: AgentType,
    pub question: String,
    // Wire name as the server spells it.
    pub runable_config: RunnableConfig,
    #[serde(default)]
    pub user_inputs: serde_json::Value,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl DebugAgentRequest {
    /// Creates a request on a fresh thread id.
    pub fn new(agent_type: AgentType, question: impl Into<String>) -> Self {
        Self {
            agent_type,
            question: question.into(),
            runable_config: RunnableConfig {
                thread_id: uuid::Uuid::new_v4().to_string(),
            },
            user_inputs: serde_json::Value::Object(serde_json::Map::new()),
            data: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    /// Continues an existing conversation thread.
    pub fn thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.runable_config.thread_id = thread_id.into();
        self
    }

    pub fn user_inputs(mut self, user_inputs: serde_json::Value) -> Self {
        self.user_inputs = user_inputs;
        self
    }

    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    pub fn validate(&self) -> Result<(), StreamError> {
        if self.question.trim().is_empty() {
            return Err(StreamError::Validation("question must not be empty".into()));
        }
        if self.runable_config.thread_id.trim().is_empty() {
            return Err(StreamError::Validation("thread_id must not be empty".into()));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<serde_json::Value, StreamError> {
        serde_json::to_value(self)
            .map_err(|e| StreamError::Validation(format!("failed to serialize request: {e}")))
    }
}
