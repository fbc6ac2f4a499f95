use crate::events::WindowInfo;
use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use windows::core::PWSTR;
use windows::Win32::Foundation::{CloseHandle, HANDLE, HWND};
use windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32, PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetForegroundWindow, GetWindowTextLengthW, GetWindowTextW, GetWindowThreadProcessId,
};

use super::r#trait::WindowProbe;

/// Максимальная длина пути NT
const MAX_IMAGE_PATH: usize = 32_768;

pub struct Win32Probe {
    timeout: Duration,
}

impl Win32Probe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait::async_trait]
impl WindowProbe for Win32Probe {
    async fn query_foreground_window(&self) -> Option<WindowInfo> {
        match tokio::time::timeout(self.timeout, tokio::task::spawn_blocking(foreground_window)).await {
            Ok(Ok(window)) => window,
            Ok(Err(e)) => {
                debug!("Опрос активного окна завершился паникой: {}", e);
                None
            }
            Err(_) => {
                debug!("Опрос активного окна не уложился в {:?}", self.timeout);
                None
            }
        }
    }
}

/// Хэндл процесса, закрывается при выходе из области видимости
struct ProcessHandle(HANDLE);

impl ProcessHandle {
    fn open(pid: u32) -> Option<Self> {
        unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) }
            .ok()
            .map(ProcessHandle)
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

fn foreground_window() -> Option<WindowInfo> {
    let hwnd = unsafe { GetForegroundWindow() };
    if hwnd.0.is_null() {
        return None;
    }

    let mut pid = 0u32;
    unsafe { GetWindowThreadProcessId(hwnd, Some(&mut pid as *mut u32)) };
    if pid == 0 {
        return None;
    }

    Some(WindowInfo::new(window_title(hwnd)).with_process_path(process_path(pid)))
}

fn process_path(pid: u32) -> PathBuf {
    let Some(handle) = ProcessHandle::open(pid) else {
        debug!("OpenProcess({}) не удался", pid);
        return PathBuf::new();
    };

    let mut buffer = vec![0u16; MAX_IMAGE_PATH];
    let mut size = buffer.len() as u32;
    let queried = unsafe {
        QueryFullProcessImageNameW(handle.0, PROCESS_NAME_WIN32, PWSTR(buffer.as_mut_ptr()), &mut size)
    };

    match queried {
        Ok(()) => PathBuf::from(OsString::from_wide(&buffer[..size as usize])),
        Err(e) => {
            debug!("QueryFullProcessImageNameW({}) не удался: {}", pid, e);
            PathBuf::new()
        }
    }
}

fn window_title(hwnd: HWND) -> String {
    unsafe {
        let length = GetWindowTextLengthW(hwnd);
        if length <= 0 {
            return String::new();
        }

        let mut buffer: Vec<u16> = vec![0; (length + 1) as usize];
        let copied = GetWindowTextW(hwnd, &mut buffer);
        if copied <= 0 {
            return String::new();
        }

        buffer.truncate(copied as usize);
        OsString::from_wide(&buffer).to_string_lossy().to_string()
    }
}
