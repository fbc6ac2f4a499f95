use crate::error::Result;
use crate::events::WindowInfo;
use std::time::Duration;
use tracing::debug;

use super::linux::ToolBackend;
use super::process::{run_tool, window_info_for};

/// Утилиты с интерфейсом xdotool: сам xdotool (X11) и kdotool (KDE Wayland)
pub struct XdoDetector {
    program: &'static str,
}

impl XdoDetector {
    pub fn xdotool() -> Self {
        Self { program: "xdotool" }
    }

    pub fn kdotool() -> Self {
        Self { program: "kdotool" }
    }
}

#[async_trait::async_trait]
impl ToolBackend for XdoDetector {
    fn name(&self) -> &'static str {
        self.program
    }

    async fn get_active_window(&self, timeout: Duration) -> Result<Option<WindowInfo>> {
        debug!("Попытка получить активное окно через {}", self.program);

        let window_id = run_tool(self.program, &["getactivewindow"], timeout).await?;
        if window_id.is_empty() {
            return Ok(None);
        }

        let title = run_tool(self.program, &["getwindowname", &window_id], timeout)
            .await
            .unwrap_or_default();
        debug!("{} получил заголовок окна: '{}'", self.program, title);

        let pid = match run_tool(self.program, &["getwindowpid", &window_id], timeout).await {
            Ok(pid) => pid.parse::<u32>().unwrap_or(0),
            Err(e) => {
                debug!("{} не смог определить pid окна {}: {}", self.program, window_id, e);
                0
            }
        };

        Ok(window_info_for(pid, title))
    }
}
