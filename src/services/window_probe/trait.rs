use crate::events::WindowInfo;
use std::time::Duration;
use tracing::info;

/// Источник информации об активном окне.
///
/// Запрос best-effort: любая ошибка ОС превращается в `None`, время
/// ответа ограничено таймаутом реализации.
#[async_trait::async_trait]
pub trait WindowProbe: Send + Sync {
    async fn query_foreground_window(&self) -> Option<WindowInfo>;
}

/// Фабрика: эмуляция в dry-run режиме, иначе реализация для текущей платформы
pub fn create_window_probe(probe_timeout: Duration, dry_run: bool) -> Box<dyn WindowProbe> {
    if dry_run {
        info!("WindowProbe работает в режиме эмуляции");
        return Box::new(super::dry_run::DryRunProbe::new());
    }

    platform_probe(probe_timeout)
}

#[cfg(windows)]
fn platform_probe(probe_timeout: Duration) -> Box<dyn WindowProbe> {
    Box::new(super::win32::Win32Probe::new(probe_timeout))
}

#[cfg(target_os = "linux")]
fn platform_probe(probe_timeout: Duration) -> Box<dyn WindowProbe> {
    Box::new(super::linux::LinuxWindowProbe::new(probe_timeout))
}

#[cfg(not(any(windows, target_os = "linux")))]
fn platform_probe(_probe_timeout: Duration) -> Box<dyn WindowProbe> {
    tracing::warn!("Определение активного окна не поддерживается на этой платформе");
    Box::new(NullProbe)
}

/// Источник, который никогда не видит активного окна
#[cfg(any(test, not(any(windows, target_os = "linux"))))]
pub struct NullProbe;

#[cfg(any(test, not(any(windows, target_os = "linux"))))]
#[async_trait::async_trait]
impl WindowProbe for NullProbe {
    async fn query_foreground_window(&self) -> Option<WindowInfo> {
        None
    }
}
