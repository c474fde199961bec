use std::fmt;
use thiserror::Error;

const SEPARATOR: char = '|';

/// Сообщения, приходящие от клиента по control-каналу (`<kind>|<payload>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    /// Клиент представился, payload: отображаемое имя.
    Hello(String),

    /// Запрос на право говорить. Payload: имя, которое увидят остальные.
    SpeakRequestInit(String),

    /// Клиент закончил говорить.
    SpeakRequestFinish,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlParseError {
    #[error("unknown control message kind '{0}'")]
    UnknownKind(String),

    #[error("hello message without a name")]
    EmptyName,
}

impl ControlMessage {
    pub const HELLO: &'static str = "hello";
    pub const SPEAK_REQUEST_INIT: &'static str = "speak_request_init";
    pub const SPEAK_REQUEST_FINISH: &'static str = "speak_request_finish";

    /// Разбор по первому `|`. Все, что после него, считается payload (в том числе другие `|`).
    pub fn parse(text: &str) -> Result<Self, ControlParseError> {
        let (kind, payload) = text.split_once(SEPARATOR).unwrap_or((text, ""));

        match kind {
            Self::HELLO if payload.is_empty() => Err(ControlParseError::EmptyName),
            Self::HELLO => Ok(Self::Hello(payload.to_owned())),
            Self::SPEAK_REQUEST_INIT => Ok(Self::SpeakRequestInit(payload.to_owned())),
            Self::SPEAK_REQUEST_FINISH => Ok(Self::SpeakRequestFinish),
            other => Err(ControlParseError::UnknownKind(other.to_owned())),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Hello(_) => Self::HELLO,
            Self::SpeakRequestInit(_) => Self::SPEAK_REQUEST_INIT,
            Self::SpeakRequestFinish => Self::SPEAK_REQUEST_FINISH,
        }
    }
}

/// Сообщения, которые сервер отправляет клиентам по control-каналу.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    Welcome(String),
    ConnectedUsers(Vec<String>),
    Speaking(String),
    /// Тег: тип запроса, на который отвечаем (`speak_request_init` и т.д.).
    SuccessFeedback(&'static str),
    ErrorFeedback(&'static str),
}

impl OutboundMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Welcome(_) => "welcome",
            Self::ConnectedUsers(_) => "connected_users",
            Self::Speaking(_) => "speaking",
            Self::SuccessFeedback(_) => "ok",
            Self::ErrorFeedback(_) => "nok",
        }
    }
}

impl fmt::Display for OutboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind(), SEPARATOR)?;
        match self {
            Self::Welcome(name) | Self::Speaking(name) => f.write_str(name),
            Self::ConnectedUsers(names) => f.write_str(&names.join(",")),
            Self::SuccessFeedback(tag) | Self::ErrorFeedback(tag) => f.write_str(tag),
        }
    }
}
