use crate::registry::ConnectionRegistry;
use crate::relay::relay_policy::RelayPolicy;
use pushtalk_core::ConnectionId;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Результат одного шага ротации.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rotation {
    pub unmuted: Option<ConnectionId>,
    pub muted: Option<ConnectionId>,
}

/// Альтернативная политика: по таймеру заглушает одного случайного участника.
/// Заглушенный не слышит остальных и не слышен сам.
pub struct FairnessScheduler {
    registry: ConnectionRegistry,
    muted: RwLock<Option<ConnectionId>>,
}

impl FairnessScheduler {
    pub fn new(registry: ConnectionRegistry) -> Self {
        Self {
            registry,
            muted: RwLock::new(None),
        }
    }

    pub fn muted(&self) -> Option<ConnectionId> {
        self.muted
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_muted(&self, id: &ConnectionId) -> bool {
        self.muted
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            == Some(id)
    }

    /// Снять заглушку с текущего и заглушить случайного из остальных.
    /// Если участников меньше двух, никто не заглушается.
    pub fn rotate<R: Rng + ?Sized>(&self, rng: &mut R) -> Rotation {
        let ids = self.registry.ids();
        let mut muted = self.muted.write().unwrap_or_else(PoisonError::into_inner);

        let unmuted = muted.take();
        let next = if ids.len() < 2 {
            None
        } else {
            let pool: Vec<&ConnectionId> = ids
                .iter()
                .filter(|id| Some(*id) != unmuted.as_ref())
                .collect();
            pool.choose(rng).map(|id| (*id).clone())
        };
        *muted = next.clone();

        Rotation {
            unmuted,
            muted: next,
        }
    }

    /// Соединение удалено: если оно было заглушено, заглушка снимается.
    pub fn forget(&self, id: &ConnectionId) {
        let mut muted = self.muted.write().unwrap_or_else(PoisonError::into_inner);
        if muted.as_ref() == Some(id) {
            *muted = None;
        }
    }

    /// Запустить ротацию с периодом `period`. Задача живет, пока ее не прервут.
    pub fn spawn(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        info!("Fairness rotation started, period {:?}", period);

        tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            let mut ticker = tokio::time::interval(period);
            // первый тик срабатывает сразу
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let rotation = self.rotate(&mut rng);
                debug!(
                    "Rotation: unmuted {:?}, muted {:?}",
                    rotation.unmuted, rotation.muted
                );
            }
        })
    }
}

impl RelayPolicy for FairnessScheduler {
    fn admits_source(&self, from: &ConnectionId) -> bool {
        !self.is_muted(from)
    }

    fn admits_destination(&self, to: &ConnectionId) -> bool {
        !self.is_muted(to)
    }
}
