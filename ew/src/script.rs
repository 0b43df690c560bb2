//! Scripted event sequences
//!
//! A script is a YAML list of steps played onto a bus in order:
//!
//! ```yaml
//! - after_ms: 100
//!   event: messages.upsert
//!   payload: { id: "X" }
//! - after_ms: 50
//!   event: connection.update
//!   payload: { connection: close }
//! ```
//!
//! `after_ms` is relative to the previous step and defaults to 0; `payload`
//! defaults to an empty object.

use std::path::Path;
use std::time::Duration;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::events::EventBus;

/// One emission in a script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Delay before this step, relative to the previous one
    #[serde(default)]
    pub after_ms: u64,

    pub event: String,

    #[serde(default = "empty_payload")]
    pub payload: Value,
}

fn empty_payload() -> Value {
    json!({})
}

/// Ordered list of emissions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script {
    pub steps: Vec<ScriptStep>,
}

impl Script {
    /// Parse a script from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let script: Script = serde_yaml::from_str(content).context("Failed to parse script")?;
        debug!(steps = script.steps.len(), "Script::from_yaml: parsed");
        Ok(script)
    }

    /// Load a script file
    pub fn load(path: &Path) -> Result<Self> {
        debug!(?path, "Script::load: called");
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read script {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid script {}", path.display()))
    }

    /// Total delay from the first step to the last
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.steps.iter().map(|step| step.after_ms).sum())
    }

    /// Emit every step onto `bus`, sleeping between steps
    ///
    /// Returns the total number of listener deliveries.
    pub async fn play(&self, bus: &EventBus) -> usize {
        let mut delivered = 0;
        for (index, step) in self.steps.iter().enumerate() {
            if step.after_ms > 0 {
                tokio::time::sleep(Duration::from_millis(step.after_ms)).await;
            }
            let count = bus.emit(&step.event, &step.payload);
            debug!(index, event = %step.event, count, "Script::play: step emitted");
            delivered += count;
        }
        delivered
    }
}
