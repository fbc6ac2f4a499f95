use crate::error::{DesktopCatError, Result};
use crate::events::WindowInfo;
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::r#trait::WindowProbe;
use super::sway::SwayDetector;
use super::xdotool::XdoDetector;

/// Пауза перед повторным поиском рабочего метода, если не работает ни один
const REDETECT_BACKOFF: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DesktopEnvironment {
    KDE,
    Sway,
    X11Generic,
    WaylandGeneric,
    Unknown,
}

/// Внешняя утилита, через которую можно узнать активное окно.
///
/// `Err` значит, что утилита не работает в этой сессии, `Ok(None)` что
/// активного окна сейчас нет.
#[async_trait::async_trait]
pub trait ToolBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn get_active_window(&self, timeout: Duration) -> Result<Option<WindowInfo>>;
}

pub struct LinuxWindowProbe {
    timeout: Duration,
    backoff: Duration,
    // В порядке опроса для текущей среды
    backends: Vec<Box<dyn ToolBackend>>,
    working_backend: Mutex<Option<usize>>,
    retry_after: Mutex<Option<Instant>>,
}

impl LinuxWindowProbe {
    pub fn new(timeout: Duration) -> Self {
        let desktop_env = Self::detect_desktop_environment();
        info!("Обнаружена среда рабочего стола: {:?}", desktop_env);

        Self::with_backends(Self::backends_for(desktop_env), timeout, REDETECT_BACKOFF)
    }

    pub fn with_backends(backends: Vec<Box<dyn ToolBackend>>, timeout: Duration, backoff: Duration) -> Self {
        Self {
            timeout,
            backoff,
            backends,
            working_backend: Mutex::new(None),
            retry_after: Mutex::new(None),
        }
    }

    fn detect_desktop_environment() -> DesktopEnvironment {
        if std::env::var_os("SWAYSOCK").is_some() {
            return DesktopEnvironment::Sway;
        }

        if let Ok(desktop) = std::env::var("XDG_CURRENT_DESKTOP") {
            match desktop.to_lowercase().as_str() {
                d if d.contains("kde") => return DesktopEnvironment::KDE,
                d if d.contains("sway") => return DesktopEnvironment::Sway,
                _ => {}
            }
        }

        if let Ok(session) = std::env::var("XDG_SESSION_TYPE") {
            match session.as_str() {
                "wayland" => return DesktopEnvironment::WaylandGeneric,
                "x11" => return DesktopEnvironment::X11Generic,
                _ => {}
            }
        }

        DesktopEnvironment::Unknown
    }

    /// Утилиты в порядке опроса для текущей среды
    fn backends_for(desktop_env: DesktopEnvironment) -> Vec<Box<dyn ToolBackend>> {
        let kdotool = || Box::new(XdoDetector::kdotool()) as Box<dyn ToolBackend>;
        let xdotool = || Box::new(XdoDetector::xdotool()) as Box<dyn ToolBackend>;
        let sway = || Box::new(SwayDetector::new()) as Box<dyn ToolBackend>;

        match desktop_env {
            DesktopEnvironment::KDE => vec![kdotool(), xdotool()],
            DesktopEnvironment::Sway => vec![sway(), xdotool()],
            DesktopEnvironment::X11Generic => vec![xdotool()],
            DesktopEnvironment::WaylandGeneric | DesktopEnvironment::Unknown => {
                vec![xdotool(), kdotool(), sway()]
            }
        }
    }

    async fn detect_working_backend(&self) -> Result<(usize, Option<WindowInfo>)> {
        debug!("Определяем рабочий метод детекции окон...");

        for (index, backend) in self.backends.iter().enumerate() {
            match backend.get_active_window(self.timeout).await {
                Ok(window) => return Ok((index, window)),
                Err(e) => debug!("Метод {} не работает: {}", backend.name(), e),
            }
        }

        Err(DesktopCatError::ServiceUnavailable(
            "Ни один метод детекции окон не работает".to_string(),
        ))
    }

    fn in_backoff(&self) -> bool {
        self.retry_after
            .lock()
            .is_some_and(|retry_after| Instant::now() < retry_after)
    }
}

#[async_trait::async_trait]
impl WindowProbe for LinuxWindowProbe {
    async fn query_foreground_window(&self) -> Option<WindowInfo> {
        let cached = *self.working_backend.lock();

        if let Some(backend) = cached.and_then(|index| self.backends.get(index)) {
            return match backend.get_active_window(self.timeout).await {
                Ok(window) => window,
                Err(e) => {
                    warn!(
                        "Рабочий метод {} перестал работать: {}. Переопределим на следующем опросе",
                        backend.name(),
                        e
                    );
                    *self.working_backend.lock() = None;
                    None
                }
            };
        }

        if self.in_backoff() {
            return None;
        }

        match self.detect_working_backend().await {
            Ok((index, window)) => {
                info!("Используем метод детекции окон: {}", self.backends[index].name());
                *self.working_backend.lock() = Some(index);
                *self.retry_after.lock() = None;
                window
            }
            Err(e) => {
                error!("{}. Приостанавливаем детекцию на {:?}", e, self.backoff);
                *self.retry_after.lock() = Some(Instant::now() + self.backoff);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone)]
    struct FakeTool {
        name: &'static str,
        works: Arc<AtomicBool>,
        calls: Arc<AtomicUsize>,
    }

    impl FakeTool {
        fn new(name: &'static str, works: bool) -> Self {
            Self {
                name,
                works: Arc::new(AtomicBool::new(works)),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn set_works(&self, works: bool) {
            self.works.store(works, Ordering::SeqCst);
        }
    }

    #[async_trait::async_trait]
    impl ToolBackend for FakeTool {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn get_active_window(&self, _timeout: Duration) -> Result<Option<WindowInfo>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.works.load(Ordering::SeqCst) {
                Ok(Some(WindowInfo::new(self.name.to_string())))
            } else {
                Err(crate::cat_error!(service_unavailable, "{} недоступен", self.name))
            }
        }
    }

    fn linux_detector(tools: &[&FakeTool], backoff: Duration) -> LinuxWindowProbe {
        let backends = tools
            .iter()
            .map(|tool| Box::new((*tool).clone()) as Box<dyn ToolBackend>)
            .collect();
        LinuxWindowProbe::with_backends(backends, Duration::from_millis(100), backoff)
    }

    fn title(window: Option<WindowInfo>) -> Option<String> {
        window.map(|w| w.window_title)
    }

    #[tokio::test]
    async fn test_working_method_is_cached() {
        let broken = FakeTool::new("kdotool", false);
        let working = FakeTool::new("xdotool", true);
        let linux = linux_detector(&[&broken, &working], REDETECT_BACKOFF);

        assert_eq!(title(linux.query_foreground_window().await).as_deref(), Some("xdotool"));
        assert_eq!(title(linux.query_foreground_window().await).as_deref(), Some("xdotool"));
        assert_eq!(title(linux.query_foreground_window().await).as_deref(), Some("xdotool"));

        assert_eq!(broken.calls(), 1);
        assert_eq!(working.calls(), 3);
        assert_eq!(*linux.working_backend.lock(), Some(1));
    }

    #[tokio::test]
    async fn test_failed_method_is_forgotten() {
        let tool = FakeTool::new("swaymsg", true);
        let linux = linux_detector(&[&tool], REDETECT_BACKOFF);

        assert!(linux.query_foreground_window().await.is_some());
        assert_eq!(*linux.working_backend.lock(), Some(0));

        tool.set_works(false);
        assert!(linux.query_foreground_window().await.is_none());
        assert_eq!(*linux.working_backend.lock(), None);
        assert!(linux.retry_after.lock().is_none());
        assert_eq!(tool.calls(), 2);

        // Следующий опрос снова ищет рабочий метод
        tool.set_works(true);
        assert!(linux.query_foreground_window().await.is_some());
        assert_eq!(tool.calls(), 3);
        assert_eq!(*linux.working_backend.lock(), Some(0));
    }

    #[tokio::test]
    async fn test_detection_pauses_when_nothing_works() {
        let first = FakeTool::new("xdotool", false);
        let second = FakeTool::new("kdotool", false);
        let linux = linux_detector(&[&first, &second], Duration::from_millis(100));

        assert!(linux.query_foreground_window().await.is_none());
        assert!(linux.retry_after.lock().is_some());
        assert_eq!((first.calls(), second.calls()), (1, 1));

        // Во время паузы утилиты не запускаются
        assert!(linux.query_foreground_window().await.is_none());
        assert!(linux.query_foreground_window().await.is_none());
        assert_eq!((first.calls(), second.calls()), (1, 1));

        tokio::time::sleep(Duration::from_millis(150)).await;
        second.set_works(true);

        assert_eq!(title(linux.query_foreground_window().await).as_deref(), Some("kdotool"));
        assert_eq!((first.calls(), second.calls()), (2, 2));
        assert!(linux.retry_after.lock().is_none());
        assert_eq!(*linux.working_backend.lock(), Some(1));
    }

    #[test]
    fn test_backend_order_by_desktop() {
        let names = |env| {
            LinuxWindowProbe::backends_for(env)
                .iter()
                .map(|backend| backend.name())
                .collect::<Vec<_>>()
        };

        assert_eq!(names(DesktopEnvironment::KDE), ["kdotool", "xdotool"]);
        assert_eq!(names(DesktopEnvironment::Sway), ["swaymsg", "xdotool"]);
        assert_eq!(names(DesktopEnvironment::X11Generic), ["xdotool"]);
        assert_eq!(names(DesktopEnvironment::Unknown), ["xdotool", "kdotool", "swaymsg"]);
    }
}
