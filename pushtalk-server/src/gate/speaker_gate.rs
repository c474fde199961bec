use crate::error::Result;
use crate::gate::speaker_state::SpeakerState;
use crate::registry::ConnectionRegistry;
use crate::relay::RelayPolicy;
use pushtalk_core::{ConnectionId, ControlMessage, OutboundMessage};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Push-to-talk арбитр: не больше одного говорящего одновременно.
/// Обрабатывает сообщения control-канала и рассылает результаты.
pub struct SpeakerGate {
    state: Mutex<SpeakerState>,
    roster: Mutex<Vec<String>>,
    registry: ConnectionRegistry,
    server_name: String,
}

impl SpeakerGate {
    pub fn new(registry: ConnectionRegistry, server_name: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(SpeakerState::Free),
            roster: Mutex::new(Vec::new()),
            registry,
            server_name: server_name.into(),
        }
    }

    pub fn state(&self) -> SpeakerState {
        self.lock_state().clone()
    }

    pub fn current_speaker(&self) -> Option<ConnectionId> {
        self.lock_state().occupant().cloned()
    }

    /// Все имена из `hello` в порядке прихода. Только растет.
    pub fn roster(&self) -> Vec<String> {
        self.lock_roster().clone()
    }

    pub fn welcome(&self) -> OutboundMessage {
        OutboundMessage::Welcome(self.server_name.clone())
    }

    /// Разобрать и обработать текст из control-канала.
    /// Ошибка разбора возвращается вызывающему, соединение при этом не трогается.
    pub async fn handle_text(&self, from: &ConnectionId, text: &str) -> Result<()> {
        let message = ControlMessage::parse(text)?;
        debug!("Control message from {}: {:?}", from, message);
        self.handle(from, message).await;
        Ok(())
    }

    pub async fn handle(&self, from: &ConnectionId, message: ControlMessage) {
        match message {
            ControlMessage::Hello(name) => self.on_hello(from, name).await,
            ControlMessage::SpeakRequestInit(name) => self.on_speak_request(from, name).await,
            ControlMessage::SpeakRequestFinish => self.on_speak_finish(from).await,
        }
    }

    async fn on_hello(&self, from: &ConnectionId, name: String) {
        let roster = {
            let mut roster = self.lock_roster();
            roster.push(name);
            roster.clone()
        };
        let speaker = self.lock_state().speaker_name().map(str::to_owned);

        let mut reply = vec![OutboundMessage::ConnectedUsers(roster)];
        if let Some(name) = speaker {
            reply.push(OutboundMessage::Speaking(name));
        }
        self.registry.send(from, &reply).await;
    }

    async fn on_speak_request(&self, from: &ConnectionId, name: String) {
        // Проверка и захват под одним guard, guard отпускается до любых await
        let granted = self.lock_state().try_occupy(from, &name);

        if granted {
            info!("{} ({}) is now speaking", from, name);
            self.registry
                .broadcast(&[
                    OutboundMessage::SuccessFeedback(ControlMessage::SPEAK_REQUEST_INIT),
                    OutboundMessage::Speaking(name),
                ])
                .await;
        } else {
            debug!("Speak request from {} rejected, floor is taken", from);
            self.registry
                .send(
                    from,
                    &[OutboundMessage::ErrorFeedback(
                        ControlMessage::SPEAK_REQUEST_INIT,
                    )],
                )
                .await;
        }
    }

    async fn on_speak_finish(&self, from: &ConnectionId) {
        let released = self.lock_state().release_by(from);

        if released {
            info!("Floor released by {}", from);
            self.registry
                .broadcast(&[OutboundMessage::SuccessFeedback(
                    ControlMessage::SPEAK_REQUEST_FINISH,
                )])
                .await;
        } else {
            debug!("{} tried to release a floor it does not hold", from);
            self.registry
                .send(
                    from,
                    &[OutboundMessage::ErrorFeedback(
                        ControlMessage::SPEAK_REQUEST_FINISH,
                    )],
                )
                .await;
        }
    }

    /// Соединение ушло: если оно говорило, место освобождается для остальных.
    pub async fn on_disconnect(&self, id: &ConnectionId) {
        let vacated = self.lock_state().vacate(id);

        if vacated {
            info!("Speaker {} left, floor released", id);
            self.registry
                .broadcast(&[OutboundMessage::SuccessFeedback(
                    ControlMessage::SPEAK_REQUEST_FINISH,
                )])
                .await;
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SpeakerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_roster(&self) -> MutexGuard<'_, Vec<String>> {
        self.roster.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RelayPolicy for SpeakerGate {
    fn admits_source(&self, from: &ConnectionId) -> bool {
        self.lock_state().occupant() == Some(from)
    }
}
