use crate::error::{RelayError, Result};
use dashmap::DashMap;
use pushtalk_core::{ConnectionId, IceCandidate};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

struct CandidateRecord {
    candidates: Vec<IceCandidate>,
    complete: watch::Sender<bool>,
}

impl CandidateRecord {
    fn new() -> Self {
        let (complete, _) = watch::channel(false);
        Self {
            candidates: Vec::new(),
            complete,
        }
    }
}

/// Локальные ICE-кандидаты каждого соединения в порядке обнаружения
/// и сигнал окончания их сбора.
#[derive(Clone, Default)]
pub struct CandidateStore {
    records: Arc<DashMap<ConnectionId, CandidateRecord>>,
}

impl CandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Создать пустую запись, если ее еще нет.
    pub fn open(&self, id: &ConnectionId) {
        self.records
            .entry(id.clone())
            .or_insert_with(CandidateRecord::new);
    }

    pub fn append(&self, id: &ConnectionId, candidate: IceCandidate) {
        self.records
            .entry(id.clone())
            .or_insert_with(CandidateRecord::new)
            .candidates
            .push(candidate);
    }

    pub fn get(&self, id: &ConnectionId) -> Option<Vec<IceCandidate>> {
        self.records
            .get(id)
            .map(|record| record.candidates.clone())
    }

    pub fn is_complete(&self, id: &ConnectionId) -> Option<bool> {
        self.records.get(id).map(|record| *record.complete.borrow())
    }

    /// Отметить сбор завершенным и разбудить всех ожидающих.
    pub fn mark_complete(&self, id: &ConnectionId) -> bool {
        match self.records.get(id) {
            Some(record) => {
                record.complete.send_replace(true);
                true
            }
            None => false,
        }
    }

    /// Дождаться окончания сбора. Если запись удалят во время ожидания, вернется `NotFound`.
    pub async fn wait_complete(&self, id: &ConnectionId, timeout: Duration) -> Result<()> {
        let mut rx = self
            .records
            .get(id)
            .map(|record| record.complete.subscribe())
            .ok_or_else(|| RelayError::NotFound(id.clone()))?;

        match tokio::time::timeout(timeout, rx.wait_for(|done| *done)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(RelayError::NotFound(id.clone())),
            Err(_) => Err(RelayError::Timeout(timeout)),
        }
    }

    pub fn remove(&self, id: &ConnectionId) -> bool {
        self.records.remove(id).is_some()
    }
}
