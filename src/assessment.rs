use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// CO id -> assessment tools that measure it, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssessmentMap {
    tools: BTreeMap<String, Vec<String>>,
}

impl AssessmentMap {
    /// Returns `true` when the tool is selected after the toggle.
    pub fn toggle(&mut self, co_id: &str, tool: &str) -> bool {
        let selected = self.tools.entry(co_id.to_string()).or_default();
        if let Some(pos) = selected.iter().position(|t| t == tool) {
            selected.remove(pos);
            false
        } else {
            selected.push(tool.to_string());
            true
        }
    }

    pub fn tools_for(&self, co_id: &str) -> &[String] {
        self.tools.get(co_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn summary(&self, co_id: &str) -> String {
        let tools = self.tools_for(co_id);
        if tools.is_empty() {
            "None".to_string()
        } else {
            tools.join(", ")
        }
    }
}
