use crate::engine::{ConnectionState, Session};
use dashmap::DashMap;
use futures::future::join_all;
use pushtalk_core::{ConnectionId, OutboundMessage};
use std::sync::Arc;
use tracing::{debug, error};

/// Состояние обмена SDP: `no-offer -> have-local-offer -> stable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalingState {
    NoOffer,
    HaveLocalOffer,
    Stable,
}

pub struct ConnectionEntry {
    pub session: Arc<dyn Session>,
    pub signaling: SignalingState,
    pub state: ConnectionState,
    pub control_open: bool,
    pub welcomed: bool,
}

impl ConnectionEntry {
    fn new(session: Arc<dyn Session>) -> Self {
        Self {
            session,
            signaling: SignalingState::NoOffer,
            state: ConnectionState::New,
            control_open: false,
            welcomed: false,
        }
    }
}

/// Реестр соединений: единственный источник правды о том, какие соединения существуют.
/// Клонируется дешево и безопасно передается между потоками.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<DashMap<ConnectionId, ConnectionEntry>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: ConnectionId, session: Arc<dyn Session>) {
        self.connections.insert(id, ConnectionEntry::new(session));
    }

    pub fn remove(&self, id: &ConnectionId) -> Option<Arc<dyn Session>> {
        self.connections.remove(id).map(|(_, entry)| entry.session)
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn session(&self, id: &ConnectionId) -> Option<Arc<dyn Session>> {
        self.connections
            .get(id)
            .map(|entry| Arc::clone(&entry.session))
    }

    pub fn signaling_state(&self, id: &ConnectionId) -> Option<SignalingState> {
        self.connections.get(id).map(|entry| entry.signaling)
    }

    /// Изменить запись под блокировкой шарда. Внутри `f` нельзя обращаться к реестру.
    pub fn update<R>(&self, id: &ConnectionId, f: impl FnOnce(&mut ConnectionEntry) -> R) -> Option<R> {
        self.connections.get_mut(id).map(|mut entry| f(&mut entry))
    }

    pub fn ids(&self) -> Vec<ConnectionId> {
        self.connections
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Снимок всех сессий, кроме `excluded`. Итератор dashmap держит guard,
    /// поэтому сначала собираем, потом отправляем.
    pub fn sessions_except(&self, excluded: &ConnectionId) -> Vec<(ConnectionId, Arc<dyn Session>)> {
        self.connections
            .iter()
            .filter(|entry| entry.key() != excluded)
            .map(|entry| (entry.key().clone(), Arc::clone(&entry.session)))
            .collect()
    }

    fn sessions(&self) -> Vec<(ConnectionId, Arc<dyn Session>)> {
        self.connections
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(&entry.session)))
            .collect()
    }

    /// Отправить сообщения одному соединению, по порядку.
    pub async fn send(&self, id: &ConnectionId, messages: &[OutboundMessage]) {
        let Some(session) = self.session(id) else {
            // Соединение могло закрыться в момент обработки
            debug!("Attempted to send control message to removed connection {}", id);
            return;
        };
        deliver(id, session.as_ref(), messages).await;
    }

    /// Разослать сообщения всем соединениям. Порядок сохраняется внутри одного получателя,
    /// получатели обслуживаются параллельно.
    pub async fn broadcast(&self, messages: &[OutboundMessage]) {
        let targets = self.sessions();
        join_all(
            targets
                .iter()
                .map(|(id, session)| deliver(id, session.as_ref(), messages)),
        )
        .await;
    }
}

async fn deliver(id: &ConnectionId, session: &dyn Session, messages: &[OutboundMessage]) {
    for message in messages {
        if let Err(e) = session.send_text(message.to_string()).await {
            error!("Failed to send '{}' to {}: {:#}", message.kind(), id, e);
            return;
        }
    }
}
