use crate::error::Result;
use crate::events::WindowInfo;
use serde_json::Value;
use std::time::Duration;

use super::linux::ToolBackend;
use super::process::{run_tool, window_info_for};

pub struct SwayDetector;

impl SwayDetector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl ToolBackend for SwayDetector {
    fn name(&self) -> &'static str {
        "swaymsg"
    }

    async fn get_active_window(&self, timeout: Duration) -> Result<Option<WindowInfo>> {
        let stdout = run_tool("swaymsg", &["-t", "get_tree"], timeout).await?;

        let tree: Value = serde_json::from_str(&stdout)
            .map_err(|e| crate::cat_error!(internal, "swaymsg вернул некорректный JSON: {}", e))?;

        Ok(focused_window(&tree))
    }
}

/// Ищет сфокусированный узел дерева sway. Рабочий стол без окон тоже бывает
/// сфокусирован, но у него нет pid.
fn focused_window(tree: &Value) -> Option<WindowInfo> {
    let node = find_focused(tree)?;

    let pid = node.get("pid").and_then(Value::as_u64).unwrap_or(0);
    let title = node
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    window_info_for(u32::try_from(pid).unwrap_or(0), title)
}

fn find_focused(node: &Value) -> Option<&Value> {
    if node.get("focused").and_then(Value::as_bool) == Some(true) {
        return Some(node);
    }

    ["nodes", "floating_nodes"]
        .iter()
        .filter_map(|key| node.get(*key).and_then(Value::as_array))
        .flatten()
        .find_map(find_focused)
}
