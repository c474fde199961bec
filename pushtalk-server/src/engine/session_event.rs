use pushtalk_core::IceCandidate;

/// Состояние сбора локальных ICE-кандидатов.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatheringState {
    New,
    Gathering,
    Complete,
}

/// Состояние peer connection, как его сообщает движок.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl ConnectionState {
    /// После этих состояний соединение убирается из всех компонентов.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Disconnected | Self::Failed | Self::Closed)
    }
}

/// События, которые сессия движка генерирует для контроллера жизненного цикла.
/// У каждого соединения своя очередь, поэтому идентификатор не передается.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Найден локальный ICE-кандидат.
    CandidateDiscovered(IceCandidate),

    GatheringStateChanged(GatheringState),

    ConnectionStateChanged(ConnectionState),

    /// Control-канал открыт и готов к записи.
    ControlOpened,

    ControlClosed,

    /// Текстовое сообщение из control-канала.
    ControlMessage(String),
}
