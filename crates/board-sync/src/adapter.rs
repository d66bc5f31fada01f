//! SyncAdapter: apply loosely spelled operations to a live host document.
//!
//! One call runs a full reconciliation cycle:
//!
//! 1. read the host document (never a cached copy) and rebuild the
//!    operations service over it
//! 2. normalize every request; failures go straight into the ledger
//! 3. execute the normalized operations as one two-phase batch
//! 4. give new nodes and edges host ids, rewrite edges through that map
//!    and fill in default edge sides
//! 5. write the whole document back in one call
//! 6. persist, then persist again after each delay of the
//!    [`PersistPolicy`](crate::config::PersistPolicy)
//!
//! The host may be written by others between steps 1 and 5; the last
//! writer wins. The delayed persists are a best-effort mitigation against
//! losing that race before the host flushes, not a guarantee. There is no
//! locking and no rollback.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use board_ops::{ErrorKind, Operation, OperationOutcome, OperationsService};

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::host::HostDocument;
use crate::normalize::{normalize, peek_kind};
use crate::reconcile::reconcile;

/// Result of one [`SyncAdapter::apply`] call.
///
/// `success` is `false` only when the host document could not be read or
/// written; individual operation failures live in `results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub success: bool,
    /// One or more entries per request, in submitted order. Ids are host
    /// ids, or internal ids if the write failed.
    pub results: Vec<OperationOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Internal id to host id, for every created node and edge.
    #[serde(default)]
    pub id_map: IndexMap<String, String>,
}

impl SyncReport {
    fn aborted(err: SyncError, results: Vec<OperationOutcome>) -> Self {
        tracing::warn!(error = %err, "sync aborted");
        SyncReport {
            success: false,
            results,
            error: Some(err.to_string()),
            error_kind: Some(err.kind()),
            id_map: IndexMap::new(),
        }
    }

    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }
}

/// Applies operation payloads to a [`HostDocument`].
#[derive(Debug)]
pub struct SyncAdapter<H> {
    host: Arc<H>,
    config: SyncConfig,
}

impl<H> Clone for SyncAdapter<H> {
    fn clone(&self) -> Self {
        SyncAdapter {
            host: Arc::clone(&self.host),
            config: self.config.clone(),
        }
    }
}

impl<H: HostDocument + 'static> SyncAdapter<H> {
    pub fn new(host: Arc<H>, config: SyncConfig) -> Self {
        SyncAdapter { host, config }
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Accepts either an array of requests or a single request object.
    pub async fn apply_value(&self, payload: &Value) -> SyncReport {
        match payload {
            Value::Array(requests) => self.apply(requests).await,
            single => self.apply(std::slice::from_ref(single)).await,
        }
    }

    /// Runs one reconciliation cycle over `requests`.
    ///
    /// Must be called inside a tokio runtime: follow-up persists are
    /// spawned onto it and not awaited.
    pub async fn apply(&self, requests: &[Value]) -> SyncReport {
        let host_doc = match self.host.read_document() {
            Ok(doc) => doc,
            Err(err) => return SyncReport::aborted(SyncError::Read(err), Vec::new()),
        };

        let mut rejected = Vec::new();
        let mut operations: Vec<(usize, Operation)> = Vec::with_capacity(requests.len());
        for (index, raw) in requests.iter().enumerate() {
            match normalize(raw) {
                Ok(op) => operations.push((index, op)),
                Err(err) => {
                    tracing::debug!(index, error = %err, "rejected request");
                    rejected.push(OperationOutcome::rejected(
                        index,
                        peek_kind(raw),
                        err.to_string(),
                        err.kind(),
                    ));
                }
            }
        }

        let mut service = OperationsService::from_document(host_doc.clone());
        let batch = service.execute_indexed(operations.iter().map(|(i, op)| (*i, op)));

        let reconciled = reconcile(&host_doc, batch.document, &self.config);
        let mut results: Vec<OperationOutcome> = rejected
            .into_iter()
            .chain(batch.nodes)
            .chain(batch.edges)
            .collect();
        // Stable: a group's child entries stay behind the group entry.
        results.sort_by_key(|r| r.index);

        // Host ids only exist once written; an aborted report keeps the
        // internal ids.
        if let Err(err) = self.host.write_document(&reconciled.document) {
            return SyncReport::aborted(SyncError::Write(err), results);
        }
        for outcome in &mut results {
            if let Some(mapped) = outcome.id.as_ref().and_then(|id| reconciled.id_map.get(id)) {
                outcome.id = Some(mapped.clone());
            }
        }
        self.persist();

        let report = SyncReport {
            success: true,
            results,
            error: None,
            error_kind: None,
            id_map: reconciled.id_map,
        };
        tracing::info!(
            requests = requests.len(),
            failed = report.failure_count(),
            created = report.id_map.len(),
            nodes = reconciled.document.nodes.len(),
            edges = reconciled.document.edges.len(),
            "synced board"
        );
        report
    }

    /// Persists now, then schedules the policy's follow-ups on a detached
    /// task.
    fn persist(&self) {
        if let Err(err) = self.host.request_persist() {
            tracing::warn!(error = %err, "persist request failed");
        }
        let delays = self.config.persist.follow_up_delays.clone();
        if delays.is_empty() {
            return;
        }
        let host = Arc::clone(&self.host);
        tokio::spawn(async move {
            for delay in delays {
                tokio::time::sleep(delay).await;
                if let Err(err) = host.request_persist() {
                    tracing::warn!(error = %err, "follow-up persist failed");
                }
            }
        });
    }
}
