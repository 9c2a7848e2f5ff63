use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::string_arg;
use crate::error::ToolError;
use crate::trait_def::Tool;
use crate::weather::{synthesize_weather, RandomSource, ThreadRngSource};
use ragdesk_core::{ToolContext, ToolResult};

/// `get_weather`: synthetic reading for a location
pub struct GetWeatherTool {
    rng: Arc<dyn RandomSource>,
}

impl GetWeatherTool {
    pub fn new() -> Self {
        Self::with_random_source(Arc::new(ThreadRngSource))
    }

    pub fn with_random_source(rng: Arc<dyn RandomSource>) -> Self {
        Self { rng }
    }
}

impl Default for GetWeatherTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for GetWeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get current weather information for a location"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The city or location name"
                }
            },
            "required": ["location"]
        })
    }

    async fn execute(&self, _ctx: &ToolContext, args: Value) -> Result<ToolResult, ToolError> {
        let location = string_arg(&args, "location")
            .ok_or_else(|| ToolError::validation("location parameter is required"))?;
        Ok(ToolResult::Weather(synthesize_weather(location, self.rng.as_ref())))
    }
}
