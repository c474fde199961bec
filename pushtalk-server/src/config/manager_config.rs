use std::time::Duration;

pub const DEFAULT_SERVER_NAME: &str = "Pushtalk";
pub const DEFAULT_ROTATION_INTERVAL: Duration = Duration::from_secs(15);
pub const DEFAULT_GATHERING_TIMEOUT: Duration = Duration::from_secs(10);

/// Политика ретрансляции аудио. Выбирается один раз при старте.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelayMode {
    /// Все слышат всех.
    Open,
    /// Слышно только того, кто получил право говорить через control-канал.
    SpeakerGate,
    /// Раз в `interval` один случайный участник заглушается.
    RotatingMute { interval: Duration },
}

impl Default for RelayMode {
    fn default() -> Self {
        Self::SpeakerGate
    }
}

#[derive(Clone, Debug)]
pub struct ManagerConfig {
    pub relay_mode: RelayMode,
    /// Ждать ли окончания сбора ICE-кандидатов внутри `create_offer`.
    pub await_gathering: bool,
    pub gathering_timeout: Duration,
    /// Отправляется клиентам в `welcome|...`.
    pub server_name: String,
    /// Размер очереди событий одного соединения.
    pub event_buffer: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            relay_mode: RelayMode::default(),
            await_gathering: true,
            gathering_timeout: DEFAULT_GATHERING_TIMEOUT,
            server_name: DEFAULT_SERVER_NAME.to_owned(),
            event_buffer: 256,
        }
    }
}
