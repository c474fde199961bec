use crate::config::{ManagerConfig, RelayMode};
use crate::engine::{ConnectionState, Engine, GatheringState, SessionEvent, SessionHandlers};
use crate::error::{RelayError, Result};
use crate::gate::SpeakerGate;
use crate::registry::{CandidateStore, ConnectionRegistry, SignalingState};
use crate::relay::{AudioRelay, FairnessScheduler, OpenRelay, RelayPolicy};
use anyhow::anyhow;
use pushtalk_core::{ConnectionId, IceCandidate, SdpKind, SessionDescription};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Контроллер жизненного цикла соединений.
/// Ведет обмен offer/answer/ICE и разбирает события каждой сессии.
/// Клонируется дешево (внутри `Arc`).
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    engine: Arc<dyn Engine>,
    config: ManagerConfig,
    registry: ConnectionRegistry,
    candidates: CandidateStore,
    gate: Arc<SpeakerGate>,
    relay: Arc<AudioRelay>,
    fairness: Option<Arc<FairnessScheduler>>,
    rotation_task: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionManager {
    /// Для `RelayMode::RotatingMute` должен вызываться внутри tokio runtime: запускает таймер.
    pub fn new(engine: Arc<dyn Engine>, config: ManagerConfig) -> Self {
        let registry = ConnectionRegistry::new();
        let candidates = CandidateStore::new();
        let gate = Arc::new(SpeakerGate::new(
            registry.clone(),
            config.server_name.clone(),
        ));

        let mut fairness = None;
        let mut rotation_task = None;
        let policy: Arc<dyn RelayPolicy> = match config.relay_mode {
            RelayMode::Open => Arc::new(OpenRelay),
            RelayMode::SpeakerGate => gate.clone(),
            RelayMode::RotatingMute { interval } => {
                let scheduler = Arc::new(FairnessScheduler::new(registry.clone()));
                rotation_task = Some(Arc::clone(&scheduler).spawn(interval));
                fairness = Some(Arc::clone(&scheduler));
                scheduler
            }
        };
        info!("Connection manager started with {:?} relay", config.relay_mode);

        let relay = Arc::new(AudioRelay::new(registry.clone(), policy));

        Self {
            inner: Arc::new(ManagerInner {
                engine,
                config,
                registry,
                candidates,
                gate,
                relay,
                fairness,
                rotation_task: Mutex::new(rotation_task),
            }),
        }
    }

    /// Создать соединение и серверный offer.
    /// При любой ошибке соединение удаляется; повторять нужно с новым идентификатором.
    pub async fn create_offer(&self) -> Result<(SessionDescription, ConnectionId)> {
        let inner = &self.inner;
        let id = ConnectionId::new();

        // 1. Своя очередь событий у каждого соединения: порядок внутри соединения сохраняется
        let (event_tx, event_rx) = mpsc::channel(inner.config.event_buffer);
        let handlers = SessionHandlers {
            events: event_tx,
            media: inner.relay.clone(),
        };

        // 2. Сессия с аудио-треком и control-каналом
        let session = inner
            .engine
            .open_session(id.clone(), handlers)
            .await
            .map_err(|e| {
                error!("Failed to open session for {}: {:#}", id, e);
                RelayError::EngineFailure(e)
            })?;

        // 3. Регистрация до запуска обработчика, чтобы первые события не потерялись
        inner.candidates.open(&id);
        inner.registry.insert(id.clone(), session.clone());
        tokio::spawn(Arc::clone(inner).run_events(id.clone(), event_rx));

        // 4. Локальный offer
        let mut offer = match session.create_offer().await {
            Ok(offer) => offer,
            Err(e) => {
                error!("Failed to create offer for {}: {:#}", id, e);
                inner.deregister(&id).await;
                return Err(RelayError::EngineFailure(e));
            }
        };
        inner
            .registry
            .update(&id, |entry| entry.signaling = SignalingState::HaveLocalOffer);

        // 5. Ожидание сбора кандидатов с ограничением по времени
        if inner.config.await_gathering {
            let gathered = inner
                .candidates
                .wait_complete(&id, inner.config.gathering_timeout)
                .await;
            if let Err(e) = gathered {
                warn!("ICE gathering for {} did not finish: {}", id, e);
                inner.deregister(&id).await;
                return Err(match e {
                    RelayError::NotFound(_) => RelayError::EngineFailure(anyhow!(
                        "connection {} closed during ICE gathering",
                        id
                    )),
                    other => other,
                });
            }

            // Теперь в LocalDescription есть все кандидаты, клиенту не нужен trickle
            match session.local_description().await {
                Ok(Some(full)) => offer = full,
                Ok(None) => {}
                Err(e) => warn!("Failed to read local description for {}: {:#}", id, e),
            }
        }

        info!("Created offer for connection {}", id);
        Ok((offer, id))
    }

    /// Применить SDP answer клиента. Offer от клиента сервер не принимает.
    pub async fn set_remote_description(
        &self,
        id: &ConnectionId,
        description: SessionDescription,
    ) -> Result<()> {
        let registry = &self.inner.registry;
        let session = registry
            .session(id)
            .ok_or_else(|| RelayError::NotFound(id.clone()))?;

        if description.kind != SdpKind::Answer {
            return Err(RelayError::InvalidProtocol(format!(
                "server only accepts answers for remote description, got {:?}",
                description.kind
            )));
        }

        match registry.signaling_state(id) {
            Some(SignalingState::HaveLocalOffer) => {}
            Some(state) => {
                return Err(RelayError::InvalidProtocol(format!(
                    "connection {} is in {:?}, answer is not expected",
                    id, state
                )));
            }
            None => return Err(RelayError::NotFound(id.clone())),
        }

        session.set_remote_description(description).await?;
        registry.update(id, |entry| entry.signaling = SignalingState::Stable);
        debug!("Remote answer applied for {}", id);
        Ok(())
    }

    /// Удаленный ICE-кандидат передается движку без проверки синтаксиса.
    pub async fn add_ice_candidate(&self, id: &ConnectionId, candidate: IceCandidate) -> Result<()> {
        let session = self
            .inner
            .registry
            .session(id)
            .ok_or_else(|| RelayError::NotFound(id.clone()))?;

        session.add_ice_candidate(candidate).await?;
        Ok(())
    }

    /// Локальные кандидаты соединения. Доступны только после окончания сбора.
    pub fn get_ice_candidates(&self, id: &ConnectionId) -> Result<Vec<IceCandidate>> {
        let inner = &self.inner;
        if !inner.registry.contains(id) {
            return Err(RelayError::NotFound(id.clone()));
        }

        match inner.candidates.is_complete(id) {
            Some(true) => Ok(inner.candidates.get(id).unwrap_or_default()),
            _ => Err(RelayError::NotReady(id.clone())),
        }
    }

    /// Закрыть соединение явно. Тот же путь, что и при терминальном состоянии.
    pub async fn close(&self, id: &ConnectionId) -> Result<()> {
        if self.inner.deregister(id).await {
            Ok(())
        } else {
            Err(RelayError::NotFound(id.clone()))
        }
    }

    /// Закрыть все соединения и остановить таймер ротации.
    pub async fn shutdown(&self) {
        let task = self
            .inner
            .rotation_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }

        for id in self.inner.registry.ids() {
            self.inner.deregister(&id).await;
        }
        info!("Connection manager shut down");
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.inner.registry.contains(id)
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.inner.registry.ids()
    }

    pub fn signaling_state(&self, id: &ConnectionId) -> Option<SignalingState> {
        self.inner.registry.signaling_state(id)
    }

    pub fn speaker_gate(&self) -> &Arc<SpeakerGate> {
        &self.inner.gate
    }

    pub fn relay(&self) -> &Arc<AudioRelay> {
        &self.inner.relay
    }

    pub fn fairness(&self) -> Option<&Arc<FairnessScheduler>> {
        self.inner.fairness.as_ref()
    }

    pub fn candidates(&self) -> &CandidateStore {
        &self.inner.candidates
    }
}

impl ManagerInner {
    /// Цикл событий одной сессии. Завершается после терминального состояния
    /// или когда соединение уже удалено.
    async fn run_events(self: Arc<Self>, id: ConnectionId, mut events: mpsc::Receiver<SessionEvent>) {
        debug!("Event loop started for {}", id);

        while let Some(event) = events.recv().await {
            if !self.registry.contains(&id) {
                break;
            }
            if !self.handle_event(&id, event).await {
                break;
            }
        }

        debug!("Event loop finished for {}", id);
    }

    /// Возвращает `false`, когда соединение больше не нужно обслуживать.
    async fn handle_event(&self, id: &ConnectionId, event: SessionEvent) -> bool {
        match event {
            SessionEvent::CandidateDiscovered(candidate) => {
                debug!("Local ICE candidate for {}: {}", id, candidate.candidate);
                self.candidates.append(id, candidate);
            }

            SessionEvent::GatheringStateChanged(GatheringState::Complete) => {
                info!("ICE gathering complete for {}", id);
                self.candidates.mark_complete(id);
            }

            SessionEvent::GatheringStateChanged(state) => {
                debug!("ICE gathering state for {}: {:?}", id, state);
            }

            SessionEvent::ConnectionStateChanged(state) => {
                self.registry.update(id, |entry| entry.state = state);

                if state.is_terminal() {
                    info!("Connection {} is {:?}, removing", id, state);
                    self.deregister(id).await;
                    return false;
                }
                if state == ConnectionState::Connected {
                    self.welcome_if_ready(id).await;
                }
            }

            SessionEvent::ControlOpened => {
                self.registry.update(id, |entry| entry.control_open = true);
                self.welcome_if_ready(id).await;
            }

            SessionEvent::ControlClosed => {
                info!("Control channel closed for {}", id);
                self.registry.update(id, |entry| entry.control_open = false);
            }

            SessionEvent::ControlMessage(text) => {
                // Ошибки протокола не закрывают соединение
                if let Err(e) = self.gate.handle_text(id, &text).await {
                    warn!("Dropped control message from {}: {}", id, e);
                }
            }
        }

        true
    }

    /// Welcome отправляется один раз, когда соединение установлено и control-канал открыт.
    async fn welcome_if_ready(&self, id: &ConnectionId) {
        let due = self
            .registry
            .update(id, |entry| {
                let ready = entry.state == ConnectionState::Connected && entry.control_open;
                if ready && !entry.welcomed {
                    entry.welcomed = true;
                    true
                } else {
                    false
                }
            })
            .unwrap_or(false);

        if due {
            info!("Connection {} is ready, sending welcome", id);
            self.registry.send(id, &[self.gate.welcome()]).await;
        }
    }

    /// Удалить соединение отовсюду. Повторный вызов ничего не делает.
    async fn deregister(&self, id: &ConnectionId) -> bool {
        let Some(session) = self.registry.remove(id) else {
            return false;
        };

        self.candidates.remove(id);
        if let Some(fairness) = &self.fairness {
            fairness.forget(id);
        }
        self.gate.on_disconnect(id).await;

        if let Err(e) = session.close().await {
            warn!("Failed to close session {}: {:#}", id, e);
        }
        info!("Connection {} removed", id);
        true
    }
}

impl Drop for ManagerInner {
    fn drop(&mut self) {
        let task = self
            .rotation_task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }
    }
}
