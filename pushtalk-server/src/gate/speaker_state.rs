use pushtalk_core::ConnectionId;

/// Кто сейчас говорит. Меняется только под мьютексом `SpeakerGate`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SpeakerState {
    #[default]
    Free,
    Occupied { id: ConnectionId, name: String },
}

impl SpeakerState {
    pub fn occupant(&self) -> Option<&ConnectionId> {
        match self {
            Self::Free => None,
            Self::Occupied { id, .. } => Some(id),
        }
    }

    pub fn speaker_name(&self) -> Option<&str> {
        match self {
            Self::Free => None,
            Self::Occupied { name, .. } => Some(name),
        }
    }

    /// `free -> occupied`. Возвращает `false`, если место уже занято (даже самим `id`).
    pub fn try_occupy(&mut self, id: &ConnectionId, name: &str) -> bool {
        if !matches!(self, Self::Free) {
            return false;
        }
        *self = Self::Occupied {
            id: id.clone(),
            name: name.to_owned(),
        };
        true
    }

    /// Освободить по запросу `requester`. Отказ, только если говорит кто-то другой.
    pub fn release_by(&mut self, requester: &ConnectionId) -> bool {
        if self.occupant().is_some_and(|id| id != requester) {
            return false;
        }
        *self = Self::Free;
        true
    }

    /// Освободить, если место держит `id`. Возвращает `true`, если состояние изменилось.
    pub fn vacate(&mut self, id: &ConnectionId) -> bool {
        if self.occupant() != Some(id) {
            return false;
        }
        *self = Self::Free;
        true
    }
}
