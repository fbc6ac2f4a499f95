use crate::events::WindowInfo;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

use super::r#trait::WindowProbe;

const SWITCH_EVERY: Duration = Duration::from_secs(10);

/// Эмулирует смену активного окна каждые 10 секунд
pub struct DryRunProbe {
    started: Instant,
    fake_windows: Vec<WindowInfo>,
}

impl DryRunProbe {
    pub fn new() -> Self {
        let fake_windows = [
            ("/usr/bin/explorer.exe", "Desktop - dry_run"),
            ("/usr/bin/game.exe", "My Game - dry_run"),
            ("/usr/bin/chrome.exe", "YouTube - Cat Videos - dry_run"),
            ("/usr/bin/code.exe", "main.rs - Editor - dry_run"),
        ]
        .into_iter()
        .map(|(path, title)| WindowInfo::new(title.to_string()).with_process_path(PathBuf::from(path)))
        .collect();

        Self {
            started: Instant::now(),
            fake_windows,
        }
    }

    fn window_at(&self, elapsed: Duration) -> &WindowInfo {
        let index = (elapsed.as_secs() / SWITCH_EVERY.as_secs()) as usize % self.fake_windows.len();
        &self.fake_windows[index]
    }
}

#[async_trait::async_trait]
impl WindowProbe for DryRunProbe {
    async fn query_foreground_window(&self) -> Option<WindowInfo> {
        let window = self.window_at(self.started.elapsed()).clone();
        crate::trace_if_enabled!("Dry-run: эмулируем активное окно {}", window);
        Some(window)
    }
}

impl Drop for DryRunProbe {
    fn drop(&mut self) {
        info!("DryRunProbe завершает работу");
    }
}
