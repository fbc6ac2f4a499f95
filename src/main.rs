use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod services;
mod utils;

use config::{AssetMappingConfig, ContextRulesConfig, DEFAULT_ASSETS_CONFIG, DEFAULT_RULES_CONFIG};
use events::AssetChangeEvent;
use services::{
    create_window_probe,
    AssetCatalog,
    AssetResolver,
    ChannelSurface,
    ContextEngine,
    DisplaySurface,
    RuleSet,
};

#[derive(Parser, Debug)]
#[command(name = "desktopcat")]
#[command(about = "Виджет-компаньон, который меняет ассет в зависимости от активного окна")]
struct Args {
    /// Путь к карте ассетов
    #[arg(long, default_value = DEFAULT_ASSETS_CONFIG)]
    assets_config: PathBuf,

    /// Путь к правилам контекста
    #[arg(long, default_value = DEFAULT_RULES_CONFIG)]
    rules_config: PathBuf,

    /// Режим сухого запуска (эмуляция активных окон вместо опроса ОС)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Явный путь к ассету: контекстный движок не запускается
    asset: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Инициализация системы логирования
    init_tracing(&args.log_level)?;

    info!("Запуск DesktopCat v{}", env!("CARGO_PKG_VERSION"));

    let (asset_config, rules_config) = load_configs(&args)?;

    let catalog = Arc::new(AssetCatalog::from_config(&asset_config));
    info!("Папка ассетов: {:?}", catalog.assets_base());
    let (surface, events_rx) = ChannelSurface::new();
    let surface = Arc::new(surface);
    let display_handle = tokio::spawn(run_display(events_rx));

    if let Some(override_path) = args.asset.as_deref() {
        let asset = catalog.resolve_override(override_path)?;
        info!("Показываем явно указанный ассет, контекстный движок не запускается");
        surface.load_asset(asset);

        wait_for_shutdown().await;
        display_handle.abort();
        return Ok(());
    }

    let rules = Arc::new(RuleSet::from_config(&rules_config));
    if rules.is_empty() {
        warn!("Правила контекста пусты - всегда будет показана категория '{}'", rules.default_category());
    }

    if args.dry_run {
        warn!("Режим сухого запуска - активные окна эмулируются");
    }

    // Начальный ассет до первого опроса
    let initial_category = match catalog.default_category() {
        "" => rules.default_category(),
        category => category,
    };
    match catalog.resolve(initial_category) {
        Ok(asset) => surface.load_asset(asset),
        Err(e) => warn!("Не удалось загрузить начальный ассет '{}': {}", initial_category, e),
    }

    let probe = create_window_probe(rules_config.probe_timeout(), args.dry_run);
    let (engine, engine_handle) = ContextEngine::new(rules, catalog, probe, surface);

    let engine_task = tokio::spawn(async move {
        if let Err(e) = engine.run().await {
            error!("Ошибка в ContextEngine: {}", e);
        }
    });

    info!("Все сервисы запущены");

    wait_for_shutdown().await;

    info!("Завершение работы...");

    engine_handle.stop();

    // Ожидаем завершения текущего опроса (с таймаутом)
    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    match tokio::time::timeout(shutdown_timeout, engine_task).await {
        Ok(_) => info!(
            "ContextEngine завершил работу, последняя категория: {:?}",
            engine_handle.current_category()
        ),
        Err(_) => warn!("Таймаут при завершении ContextEngine"),
    }

    display_handle.abort();

    info!("DesktopCat завершил работу");
    Ok(())
}

/// Обе конфигурации обязательны, даже если ассет указан явно
fn load_configs(args: &Args) -> Result<(AssetMappingConfig, ContextRulesConfig)> {
    // Загрузка карты ассетов
    let asset_config = AssetMappingConfig::load(&args.assets_config)?;
    info!("Карта ассетов загружена из: {:?}", args.assets_config);

    // Загрузка правил контекста
    let rules_config = ContextRulesConfig::load(&args.rules_config)?;
    info!("Правила контекста загружены из: {:?}", args.rules_config);

    Ok((asset_config, rules_config))
}

/// Заменяет виджет: показывает, какой ассет сейчас был бы на экране
async fn run_display(mut events_rx: mpsc::UnboundedReceiver<AssetChangeEvent>) {
    while let Some(event) = events_rx.recv().await {
        info!("Отображаем ассет: {}", event);
    }
}

async fn wait_for_shutdown() {
    // Ожидание сигнала завершения
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Получен сигнал завершения (Ctrl+C)");
        }
        Err(err) => {
            error!("Ошибка при ожидании сигнала завершения: {}", err);
        }
    }
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args_for(dir: &TempDir, extra: &[&str]) -> Args {
        let assets = dir.path().join("asset_mapping.json");
        let rules = dir.path().join("context_rules.json");
        let mut argv = vec![
            "desktopcat".to_string(),
            "--assets-config".to_string(),
            assets.display().to_string(),
            "--rules-config".to_string(),
            rules.display().to_string(),
        ];
        argv.extend(extra.iter().map(|arg| arg.to_string()));
        Args::parse_from(argv)
    }

    #[test]
    fn test_missing_rules_config_is_fatal_with_explicit_asset() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("asset_mapping.json"), r#"{"categories": {}}"#).unwrap();

        let args = args_for(&dir, &["cat.gif"]);
        assert_eq!(args.asset.as_deref(), Some(std::path::Path::new("cat.gif")));
        assert!(load_configs(&args).is_err());

        fs::write(dir.path().join("context_rules.json"), "{}").unwrap();
        let (_, rules_config) = load_configs(&args).unwrap();
        assert_eq!(rules_config.default_category, "idle");
    }
}
