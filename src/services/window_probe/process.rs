use crate::error::{DesktopCatError, Result};
use crate::events::WindowInfo;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Запускает утилиту и возвращает её stdout.
///
/// Процесс убивается, если не уложился в `timeout`.
pub async fn run_tool(program: &str, args: &[&str], timeout: Duration) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = tokio::time::timeout(timeout, output)
        .await
        .map_err(|_| crate::cat_error!(probe_unavailable, "{} не ответил за {:?}", program, timeout))??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("{} {:?} вернул ошибку: {}", program, args, stderr.trim());
        return DesktopCatError::probe_unavailable(format!("{} вернул ошибку: {}", program, stderr.trim()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Путь к исполняемому файлу процесса, пустой если недоступен
pub fn process_path(pid: u32) -> PathBuf {
    match std::fs::read_link(format!("/proc/{}/exe", pid)) {
        Ok(path) => path,
        Err(e) => {
            debug!("Не удалось прочитать /proc/{}/exe: {}", pid, e);
            PathBuf::new()
        }
    }
}

/// Собирает WindowInfo по pid владельца окна. pid 0 означает, что владелец не определён.
pub fn window_info_for(pid: u32, title: String) -> Option<WindowInfo> {
    if pid == 0 {
        return None;
    }
    Some(WindowInfo::new(title).with_process_path(process_path(pid)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_info_for_own_process() {
        let info = window_info_for(std::process::id(), "Test".to_string()).unwrap();
        assert_eq!(info.window_title, "Test");
        assert!(!info.process_name.is_empty());
        assert_eq!(info.process_name, info.process_name.to_lowercase());
    }

    #[test]
    fn test_window_info_for_unknown_owner() {
        assert!(window_info_for(0, "Test".to_string()).is_none());
    }

    #[test]
    fn test_unresolvable_path_keeps_title() {
        // pid за пределами pid_max
        let info = window_info_for(u32::MAX, "Title".to_string()).unwrap();
        assert!(info.process_name.is_empty());
        assert_eq!(info.process_path, PathBuf::new());
        assert_eq!(info.window_title, "Title");
    }

    #[tokio::test]
    async fn test_run_tool_missing_program() {
        let result = run_tool("definitely-not-a-real-tool-42", &[], Duration::from_millis(500)).await;
        assert!(result.is_err());
    }
}
