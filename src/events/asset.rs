use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Категория, которой помечаются ассеты, заданные явным путём
pub const OVERRIDE_CATEGORY: &str = "override";

/// Тип медиафайла
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    Image,
    AnimatedImage,
    Video,
}

impl MediaType {
    /// Определяет тип по расширению файла (регистронезависимо)
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "png" | "jpg" | "jpeg" | "bmp" => Some(MediaType::Image),
            "gif" => Some(MediaType::AnimatedImage),
            "mp4" | "mov" => Some(MediaType::Video),
            _ => None,
        }
    }
}

/// Конкретный файл, который нужно показать
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub path: PathBuf,
    pub media_type: MediaType,
    pub category: String,
}

impl fmt::Display for AssetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {:?} ({:?})", self.category, self.path, self.media_type)
    }
}

/// Событие смены отображаемого ассета
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetChangeEvent {
    pub descriptor: AssetDescriptor,
    pub timestamp: std::time::Instant,
}

impl AssetChangeEvent {
    pub fn new(descriptor: AssetDescriptor) -> Self {
        Self {
            descriptor,
            timestamp: std::time::Instant::now(),
        }
    }
}

impl fmt::Display for AssetChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}ms ago)",
            self.descriptor,
            self.timestamp.elapsed().as_millis()
        )
    }
}
