use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{AssetMappingConfig, CategoryEntry};
use crate::error::ResolutionError;
use crate::events::{AssetDescriptor, MediaType, OVERRIDE_CATEGORY};
use crate::utils::paths::expand_home;

/// Разрешение категории в конкретный медиафайл.
///
/// Реализации не кэшируют результат: файлы ассетов могут быть заменены
/// снаружи между переключениями.
pub trait AssetResolver: Send + Sync {
    fn resolve(&self, category: &str) -> Result<AssetDescriptor, ResolutionError>;
}

/// Каталог ассетов: категория -> папка -> файл
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    assets_base: PathBuf,
    default_category: String,
    categories: HashMap<String, CategoryEntry>,
}

impl AssetCatalog {
    #[cfg(test)]
    pub fn new(assets_base: impl Into<PathBuf>, categories: HashMap<String, CategoryEntry>) -> Self {
        Self {
            assets_base: assets_base.into(),
            default_category: String::new(),
            categories,
        }
    }

    pub fn from_config(config: &AssetMappingConfig) -> Self {
        Self {
            assets_base: config.assets_base.clone(),
            default_category: config.default_category.clone(),
            categories: config.categories.clone(),
        }
    }

    /// Категория по умолчанию из карты ассетов (может быть пустой)
    pub fn default_category(&self) -> &str {
        &self.default_category
    }

    pub fn assets_base(&self) -> &Path {
        &self.assets_base
    }

    /// Разрешает явно указанный путь в обход категорий
    pub fn resolve_override(&self, path: &Path) -> Result<AssetDescriptor, ResolutionError> {
        let path = expand_home(path);
        let path = fs::canonicalize(&path).map_err(|_| ResolutionError::PreferredFileMissing {
            category: OVERRIDE_CATEGORY.to_string(),
            path: path.clone(),
        })?;

        if !path.is_file() {
            return Err(ResolutionError::PreferredFileMissing {
                category: OVERRIDE_CATEGORY.to_string(),
                path,
            });
        }

        describe(path, OVERRIDE_CATEGORY)
    }

    fn resolve_entry(&self, category: &str, entry: &CategoryEntry) -> Result<AssetDescriptor, ResolutionError> {
        let folder = self.assets_base.join(&entry.folder);
        if !folder.is_dir() {
            return Err(ResolutionError::FolderMissing {
                category: category.to_string(),
                path: folder,
            });
        }

        if let Some(preferred) = entry.preferred_file.as_deref() {
            let candidate = folder.join(preferred);
            if !candidate.exists() {
                return Err(ResolutionError::PreferredFileMissing {
                    category: category.to_string(),
                    path: candidate,
                });
            }
            return describe(candidate, category);
        }

        let selected = first_supported_file(&folder)?;
        describe(selected, category)
    }
}

impl AssetResolver for AssetCatalog {
    fn resolve(&self, category: &str) -> Result<AssetDescriptor, ResolutionError> {
        let entry = self
            .categories
            .get(category)
            .ok_or_else(|| ResolutionError::UnknownCategory(category.to_string()))?;

        let descriptor = self.resolve_entry(category, entry)?;
        debug!("Категория '{}' разрешена в {:?}", category, descriptor.path);
        Ok(descriptor)
    }
}

/// Первый по имени файл папки с поддерживаемым расширением
fn first_supported_file(folder: &Path) -> Result<PathBuf, ResolutionError> {
    let no_media = || ResolutionError::NoSupportedMedia {
        path: folder.to_path_buf(),
    };

    let entries = fs::read_dir(folder).map_err(|_| no_media())?;

    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && MediaType::from_path(path).is_some())
        .min_by(|a, b| compare_names(a, b))
        .ok_or_else(no_media)
}

/// Порядок имён файлов в папке: на Windows без учёта регистра, как в проводнике
#[cfg(windows)]
fn compare_names(a: &Path, b: &Path) -> std::cmp::Ordering {
    let lower = |path: &Path| path.file_name().map(|name| name.to_string_lossy().to_lowercase());
    lower(a)
        .cmp(&lower(b))
        .then_with(|| a.file_name().cmp(&b.file_name()))
}

#[cfg(not(windows))]
fn compare_names(a: &Path, b: &Path) -> std::cmp::Ordering {
    a.file_name().cmp(&b.file_name())
}

fn describe(path: PathBuf, category: &str) -> Result<AssetDescriptor, ResolutionError> {
    let media_type = MediaType::from_path(&path)
        .ok_or_else(|| ResolutionError::UnsupportedMediaType { path: path.clone() })?;

    Ok(AssetDescriptor {
        path,
        media_type,
        category: category.to_string(),
    })
}
