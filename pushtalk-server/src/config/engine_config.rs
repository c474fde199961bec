use pushtalk_core::IceServerConfig;

pub const DEFAULT_STUN_URL: &str = "stun:stun1.l.google.com:19302";
pub const DEFAULT_TURN_URL: &str = "turn:turn.anyfirewall.com:443?transport=tcp";
pub const DEFAULT_TURN_USERNAME: &str = "webrtc";
pub const DEFAULT_TURN_CREDENTIAL: &str = "webrtc";

/// Параметры единственного аудио-кодека сессии (Opus, 48 кГц, стерео).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioCodecConfig {
    pub payload_type: u8,
    pub clock_rate: u32,
    pub channels: u16,
    pub fmtp: String,
}

impl Default for AudioCodecConfig {
    fn default() -> Self {
        Self {
            payload_type: 111,
            clock_rate: 48_000,
            channels: 2,
            fmtp: "minptime=10;maxptime=50;useinbandfec=1".to_owned(),
        }
    }
}

/// Конфигурация для WebRTC
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub ice_servers: Vec<IceServerConfig>,
    pub audio: AudioCodecConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![
                IceServerConfig::stun(DEFAULT_STUN_URL),
                IceServerConfig::turn(
                    DEFAULT_TURN_URL,
                    DEFAULT_TURN_USERNAME,
                    DEFAULT_TURN_CREDENTIAL,
                ),
            ],
            audio: AudioCodecConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Без STUN/TURN: только host-кандидаты. Удобно для локальных тестов.
    pub fn host_only() -> Self {
        Self {
            ice_servers: vec![],
            audio: AudioCodecConfig::default(),
        }
    }
}
