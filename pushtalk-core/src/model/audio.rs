use bytes::Bytes;

/// Один входящий RTP-пакет аудио в том виде, в каком он пересылается дальше.
/// Полезная нагрузка не декодируется и не перекодируется.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPacket {
    pub payload: Bytes,
    pub timestamp: u32,
    pub marker: bool,
    pub payload_type: u8,
}
