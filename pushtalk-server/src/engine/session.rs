use crate::engine::session_event::SessionEvent;
use anyhow::Result;
use async_trait::async_trait;
use pushtalk_core::{AudioPacket, ConnectionId, IceCandidate, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Куда сессия отдает события и входящее аудио.
/// Аудио идет мимо очереди событий, чтобы медиа никогда не ждало control plane.
#[derive(Clone)]
pub struct SessionHandlers {
    pub events: mpsc::Sender<SessionEvent>,
    pub media: Arc<dyn MediaSink>,
}

/// Фабрика сессий. Каждая сессия заранее настроена на один sendrecv аудио-трек
/// и один control-канал.
#[async_trait]
pub trait Engine: Send + Sync + 'static {
    async fn open_session(
        &self,
        id: ConnectionId,
        handlers: SessionHandlers,
    ) -> Result<Arc<dyn Session>>;
}

/// Одна WebRTC-сессия с клиентом.
#[async_trait]
pub trait Session: Send + Sync + 'static {
    /// Создать локальный offer и установить его как LocalDescription.
    async fn create_offer(&self) -> Result<SessionDescription>;

    /// Текущее LocalDescription. После сбора кандидатов содержит их все.
    async fn local_description(&self) -> Result<Option<SessionDescription>>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    /// Отправить текст в control-канал.
    async fn send_text(&self, text: String) -> Result<()>;

    /// Отправить RTP-пакет аудио без перекодирования.
    async fn write_audio(&self, packet: &AudioPacket) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Получатель входящего аудио.
#[async_trait]
pub trait MediaSink: Send + Sync + 'static {
    /// Возвращает число получателей, которым пакет был успешно отправлен.
    async fn forward(&self, from: &ConnectionId, packet: AudioPacket) -> usize;
}
