use crate::events::{AssetChangeEvent, AssetDescriptor};
use tokio::sync::mpsc;
use tracing::warn;

/// Поверхность отображения виджета (рендер вне этого крейта)
pub trait DisplaySurface: Send + Sync {
    fn load_asset(&self, descriptor: AssetDescriptor);
}

/// Пересылает смены ассета в канал тому, кто рисует виджет
pub struct ChannelSurface {
    tx: mpsc::UnboundedSender<AssetChangeEvent>,
}

impl ChannelSurface {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AssetChangeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl DisplaySurface for ChannelSurface {
    fn load_asset(&self, descriptor: AssetDescriptor) {
        if let Err(e) = self.tx.send(AssetChangeEvent::new(descriptor)) {
            warn!("Получатель событий ассетов закрыт: {}", e.0.descriptor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MediaType;
    use std::path::PathBuf;

    #[test]
    fn test_channel_surface_forwards() {
        let (surface, mut rx) = ChannelSurface::new();
        let descriptor = AssetDescriptor {
            path: PathBuf::from("idle/a.png"),
            media_type: MediaType::Image,
            category: "idle".to_string(),
        };

        surface.load_asset(descriptor.clone());
        assert_eq!(rx.try_recv().unwrap().descriptor, descriptor);

        drop(rx);
        // закрытый получатель не паникует
        surface.load_asset(descriptor);
    }
}
