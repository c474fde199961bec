use crate::engine::{MediaSink, Session};
use crate::registry::ConnectionRegistry;
use crate::relay::relay_policy::RelayPolicy;
use async_trait::async_trait;
use futures::future::join_all;
use pushtalk_core::{AudioPacket, ConnectionId};
use std::sync::Arc;
use tracing::{trace, warn};

/// Пересылает входящее аудио остальным участникам без изменений.
pub struct AudioRelay {
    registry: ConnectionRegistry,
    policy: Arc<dyn RelayPolicy>,
}

impl AudioRelay {
    pub fn new(registry: ConnectionRegistry, policy: Arc<dyn RelayPolicy>) -> Self {
        Self { registry, policy }
    }

    /// Кому отправить пакет от `from` прямо сейчас.
    pub fn destinations(&self, from: &ConnectionId) -> Vec<(ConnectionId, Arc<dyn Session>)> {
        // Удаленное соединение больше не может быть источником, даже если пакеты еще идут
        if !self.registry.contains(from) || !self.policy.admits_source(from) {
            return Vec::new();
        }

        let mut targets = self.registry.sessions_except(from);
        targets.retain(|(id, _)| self.policy.admits_destination(id));
        targets
    }
}

#[async_trait]
impl MediaSink for AudioRelay {
    async fn forward(&self, from: &ConnectionId, packet: AudioPacket) -> usize {
        let targets = self.destinations(from);
        if targets.is_empty() {
            trace!("Dropped audio packet from {}", from);
            return 0;
        }

        let packet = &packet;
        let sends = targets.iter().map(|(id, session)| async move {
            match session.write_audio(packet).await {
                Ok(()) => true,
                Err(e) => {
                    warn!("Failed to relay audio from {} to {}: {:#}", from, id, e);
                    false
                }
            }
        });

        join_all(sends).await.into_iter().filter(|sent| *sent).count()
    }
}
