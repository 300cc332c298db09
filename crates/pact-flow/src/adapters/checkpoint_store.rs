//! In-memory checkpoint store.

use crate::domain::checkpoint::FlowCheckpoint;
use crate::error::FlowResult;
use crate::ports::outbound::CheckpointStore;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

/// Append-only checkpoint log keyed by flow id.
#[derive(Default)]
pub struct InMemoryCheckpointStore {
    records: Mutex<HashMap<Uuid, Vec<FlowCheckpoint>>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn record(&self, checkpoint: FlowCheckpoint) -> FlowResult<()> {
        self.records
            .lock()
            .entry(checkpoint.flow_id)
            .or_default()
            .push(checkpoint);
        Ok(())
    }

    async fn latest(&self, flow_id: Uuid) -> FlowResult<Option<FlowCheckpoint>> {
        Ok(self
            .records
            .lock()
            .get(&flow_id)
            .and_then(|log| log.last().cloned()))
    }

    async fn history(&self, flow_id: Uuid) -> FlowResult<Vec<FlowCheckpoint>> {
        Ok(self.records.lock().get(&flow_id).cloned().unwrap_or_default())
    }
}
