//! Match snapshots and the in-memory store that keeps them.

use std::collections::HashMap;

use broadside_protocol::{Codec, Identity, JsonCodec};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{FleetGrid, MatchError};

/// Everything needed to resume a match: both grids, whose turn it is,
/// and the move counters.
///
/// Overwritten after every turn; older snapshots are not kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "G: FleetGrid")]
pub struct MatchSnapshot<G> {
    pub grids: [G; 2],
    pub turn: usize,
    pub moves: [u32; 2],
}

/// In-memory snapshot storage, keyed by identity.
///
/// Snapshots are stored encoded, so what comes back from
/// [`load`](Self::load) is always a detached copy, never a view of the
/// live match. Nothing survives a process restart.
pub struct SnapshotStore<C: Codec = JsonCodec> {
    codec: C,
    entries: Mutex<HashMap<Identity, Vec<u8>>>,
}

impl SnapshotStore<JsonCodec> {
    pub fn new() -> Self {
        Self::with_codec(JsonCodec)
    }
}

impl Default for SnapshotStore<JsonCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Codec> SnapshotStore<C> {
    pub fn with_codec(codec: C) -> Self {
        Self {
            codec,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Stores `snapshot` under both identities, replacing what was there.
    pub async fn save<G: FleetGrid>(
        &self,
        a: &Identity,
        b: &Identity,
        snapshot: &MatchSnapshot<G>,
    ) -> Result<(), MatchError> {
        let bytes = self.codec.encode(snapshot)?;
        let mut entries = self.entries.lock().await;
        entries.insert(a.clone(), bytes.clone());
        entries.insert(b.clone(), bytes);
        Ok(())
    }

    /// The latest snapshot saved for `identity`, if any.
    pub async fn load<G: FleetGrid>(
        &self,
        identity: &Identity,
    ) -> Result<Option<MatchSnapshot<G>>, MatchError> {
        let entries = self.entries.lock().await;
        match entries.get(identity) {
            Some(bytes) => Ok(Some(self.codec.decode(bytes)?)),
            None => Ok(None),
        }
    }

    /// Drops the snapshots of both identities.
    pub async fn clear(&self, a: &Identity, b: &Identity) {
        let mut entries = self.entries.lock().await;
        entries.remove(a);
        entries.remove(b);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
