use pushtalk_core::ConnectionId;

/// Стратегия ретрансляции: чей звук пропускать и кому его отдавать.
/// Вызывается на каждый пакет, поэтому реализации должны только читать состояние.
pub trait RelayPolicy: Send + Sync + 'static {
    fn admits_source(&self, from: &ConnectionId) -> bool;

    fn admits_destination(&self, _to: &ConnectionId) -> bool {
        true
    }
}

/// Без арбитража: все слышат всех.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenRelay;

impl RelayPolicy for OpenRelay {
    fn admits_source(&self, _from: &ConnectionId) -> bool {
        true
    }
}
