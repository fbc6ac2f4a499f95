use std::path::PathBuf;
use thiserror::Error;

/// Ошибки разрешения категории в конкретный медиафайл.
///
/// Все варианты не фатальны для движка: они приводят к попытке
/// разрешить категорию по умолчанию.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Неизвестная категория: {0}")]
    UnknownCategory(String),

    #[error("Папка категории '{category}' не найдена: {path:?}")]
    FolderMissing { category: String, path: PathBuf },

    #[error("Предпочтительный файл категории '{category}' не найден: {path:?}")]
    PreferredFileMissing { category: String, path: PathBuf },

    #[error("В папке {path:?} нет поддерживаемых медиафайлов")]
    NoSupportedMedia { path: PathBuf },

    #[error("Неподдерживаемый тип медиафайла: {path:?}")]
    UnsupportedMediaType { path: PathBuf },
}

#[derive(Error, Debug)]
pub enum DesktopCatError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Не удалось опросить активное окно: {0}")]
    ProbeUnavailable(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl DesktopCatError {
    pub fn probe_unavailable<T>(msg: impl Into<String>) -> Result<T> {
        Err(DesktopCatError::ProbeUnavailable(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, DesktopCatError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! cat_error {
    (probe_unavailable, $($arg:tt)*) => {
        $crate::error::DesktopCatError::ProbeUnavailable(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::DesktopCatError::ServiceUnavailable(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::DesktopCatError::Internal(format!($($arg)*))
    };
}
