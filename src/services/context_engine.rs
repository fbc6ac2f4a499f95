use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::AssetDescriptor;
use crate::services::{AssetResolver, DisplaySurface, RuleSet, WindowProbe};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

/// Результат одного цикла опроса
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Категория не изменилась, файловая система не трогалась
    Unchanged,
    Switched(String),
    /// Новая категория не разрешилась, показана категория по умолчанию
    FellBack { requested: String, category: String },
    /// Не разрешилась ни новая категория, ни категория по умолчанию
    Failed { requested: String },
    Stopped,
}

/// Управление движком со стороны владельца
pub struct EngineHandle {
    stop_tx: watch::Sender<bool>,
    current_category: Arc<RwLock<Option<String>>>,
}

impl EngineHandle {
    /// Останавливает движок до следующего запланированного опроса
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    #[cfg(test)]
    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }

    pub fn current_category(&self) -> Option<String> {
        self.current_category.read().clone()
    }
}

/// Опрашивает активное окно и переключает ассет при смене категории.
///
/// Ошибки отдельного цикла не выходят за его пределы: после одной попытки
/// отката к категории по умолчанию они только логируются.
pub struct ContextEngine {
    rules: Arc<RuleSet>,
    resolver: Arc<dyn AssetResolver>,
    probe: Box<dyn WindowProbe>,
    surface: Arc<dyn DisplaySurface>,
    current_category: Arc<RwLock<Option<String>>>,
    stop_rx: watch::Receiver<bool>,
}

impl ContextEngine {
    pub fn new(
        rules: Arc<RuleSet>,
        resolver: Arc<dyn AssetResolver>,
        probe: Box<dyn WindowProbe>,
        surface: Arc<dyn DisplaySurface>,
    ) -> (Self, EngineHandle) {
        let (stop_tx, stop_rx) = watch::channel(false);
        let current_category = Arc::new(RwLock::new(None));

        let engine = Self {
            rules,
            resolver,
            probe,
            surface,
            current_category: current_category.clone(),
            stop_rx,
        };

        (engine, EngineHandle { stop_tx, current_category })
    }

    fn is_stopped(&self) -> bool {
        *self.stop_rx.borrow()
    }

    /// Крутит опрос с интервалом из правил, пока владелец не остановит движок
    /// или не уронит `EngineHandle`.
    pub async fn run(self) -> Result<()> {
        info!(
            "ContextEngine запущен: {} правил, интервал {:?}, категория по умолчанию '{}'",
            self.rules.len(),
            self.rules.poll_interval(),
            self.rules.default_category()
        );

        let mut stop_rx = self.stop_rx.clone();
        let mut interval = interval(self.rules.poll_interval());
        // Следующий тик взводится только после завершения текущего
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if self.is_stopped() {
                break;
            }

            tokio::select! {
                biased;
                changed = stop_rx.changed() => {
                    if changed.is_err() {
                        info!("EngineHandle уничтожен, останавливаем опрос");
                        break;
                    }
                }
                _ = interval.tick() => {
                    if self.tick().await == TickOutcome::Stopped {
                        break;
                    }
                }
            }
        }

        info!("ContextEngine остановлен");
        Ok(())
    }

    /// Один цикл: опрос -> классификация -> (при смене категории) разрешение и показ
    pub async fn tick(&self) -> TickOutcome {
        if self.is_stopped() {
            return TickOutcome::Stopped;
        }

        let window = self.probe.query_foreground_window().await;
        let category = self.rules.classify(window.as_ref());

        if self.current_category.read().as_deref() == Some(category) {
            crate::trace_if_enabled!("Категория не изменилась: '{}'", category);
            return TickOutcome::Unchanged;
        }

        debug_if_enabled!(
            "Смена категории: {:?} -> '{}' (окно: {})",
            self.current_category.read().as_deref(),
            category,
            window.as_ref().map(ToString::to_string).unwrap_or_else(|| "None".to_string())
        );

        let requested = category.to_string();
        let error = match self.resolver.resolve(category) {
            Ok(asset) => {
                self.switch_to(category, asset);
                return TickOutcome::Switched(requested);
            }
            Err(e) => e,
        };

        let default_category = self.rules.default_category();
        if category == default_category {
            error!("Не удалось разрешить категорию по умолчанию '{}': {}", category, error);
            return TickOutcome::Failed { requested };
        }

        warn!(
            "Не удалось разрешить категорию '{}': {}. Откатываемся на '{}'",
            category, error, default_category
        );

        match self.resolver.resolve(default_category) {
            Ok(asset) => {
                self.switch_to(default_category, asset);
                TickOutcome::FellBack {
                    requested,
                    category: default_category.to_string(),
                }
            }
            Err(e) => {
                error!(
                    "Категория по умолчанию '{}' тоже не разрешилась: {}. Ассет не меняется",
                    default_category, e
                );
                TickOutcome::Failed { requested }
            }
        }
    }

    fn switch_to(&self, category: &str, asset: AssetDescriptor) {
        info!("Новый ассет для категории '{}': {:?}", category, asset.path);
        *self.current_category.write() = Some(category.to_string());
        self.surface.load_asset(asset);
    }
}
