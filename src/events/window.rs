use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Информация об активном окне, полученная за один опрос
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowInfo {
    /// Имя исполняемого файла в нижнем регистре, может быть пустым
    pub process_name: String,
    /// Полный путь к исполняемому файлу, пустой если не удалось определить
    pub process_path: PathBuf,
    pub window_title: String,
}

impl WindowInfo {
    pub fn new(window_title: String) -> Self {
        Self {
            process_name: String::new(),
            process_path: PathBuf::new(),
            window_title,
        }
    }

    /// Устанавливает путь процесса и выводит из него имя процесса
    pub fn with_process_path(mut self, path: PathBuf) -> Self {
        self.process_name = process_name_from_path(&path);
        self.process_path = path;
        self
    }

    #[cfg(test)]
    pub fn with_process_name(mut self, name: &str) -> Self {
        self.process_name = name.to_lowercase();
        self
    }
}

/// Имя файла из пути к образу процесса, в нижнем регистре
pub fn process_name_from_path(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

impl fmt::Display for WindowInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.process_name.is_empty() {
            write!(f, "\"{}\"", self.window_title)
        } else {
            write!(f, "\"{}\" ({})", self.window_title, self.process_name)
        }
    }
}
