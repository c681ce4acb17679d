//! Single-consumer FIFO effect pipeline.
//!
//! Producers append requests through a cloneable [`EffectQueue`] handle and
//! never wait.  One worker task drains the channel strictly in submission
//! order, awaiting each sink call before starting the next, so a create and
//! a later delete for the same visual can never interleave.
//!
//! The worker keeps the set of live visuals.  A failed call is logged and the
//! visual is treated as absent from then on; updates and deletes of absent
//! visuals are skipped.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::effect::{EffectKey, EffectKind, EffectRequest, EffectSink};
use crate::{EffectError, EffectResult};

enum QueueItem {
    Apply(EffectRequest),
    /// Reply once everything submitted before it has been applied.
    Flush(oneshot::Sender<()>),
}

/// Handle to the effect worker.  Cloning is cheap; the worker stops once
/// every handle is dropped and the backlog is drained.
#[derive(Clone, Debug)]
pub struct EffectQueue {
    tx: mpsc::UnboundedSender<QueueItem>,
}

impl EffectQueue {
    /// Spawn the worker on the current runtime.
    pub fn spawn(sink: Arc<dyn EffectSink>) -> (EffectQueue, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = EffectWorker { sink, live: BTreeSet::new(), rx };
        let handle = tokio::spawn(worker.run());
        (EffectQueue { tx }, handle)
    }

    /// Append one request.
    pub fn submit(&self, request: EffectRequest) -> EffectResult<()> {
        self.tx.send(QueueItem::Apply(request)).map_err(|_| EffectError::Closed)
    }

    /// Append requests in iteration order.
    pub fn submit_all(&self, requests: impl IntoIterator<Item = EffectRequest>) -> EffectResult<()> {
        requests.into_iter().try_for_each(|r| self.submit(r))
    }

    pub fn clear_agent(&self, agent: rc_core::AgentId) -> EffectResult<()> {
        self.submit(EffectRequest::ClearAgent { agent })
    }

    /// Remove every live visual.
    pub fn clear_all(&self) -> EffectResult<()> {
        self.submit(EffectRequest::ClearAll)
    }

    /// Wait until every request submitted so far has been applied.
    pub async fn flush(&self) -> EffectResult<()> {
        let (tx, rx) = oneshot::channel();
        self.tx.send(QueueItem::Flush(tx)).map_err(|_| EffectError::Closed)?;
        rx.await.map_err(|_| EffectError::Closed)
    }

    /// `true` once the worker has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

// ── Worker ────────────────────────────────────────────────────────────────────

struct EffectWorker {
    sink: Arc<dyn EffectSink>,
    live: BTreeSet<EffectKey>,
    rx:   mpsc::UnboundedReceiver<QueueItem>,
}

impl EffectWorker {
    async fn run(mut self) {
        while let Some(item) = self.rx.recv().await {
            match item {
                QueueItem::Apply(request) => self.apply(request).await,
                QueueItem::Flush(reply) => {
                    let _ = reply.send(());
                }
            }
        }
        debug!(live = self.live.len(), "effect queue: worker stopped");
    }

    async fn apply(&mut self, request: EffectRequest) {
        match request {
            EffectRequest::Create { key, payload } => {
                if self.live.contains(&key) {
                    self.delete(key).await;
                }
                match self.sink.create_effect(key, &payload).await {
                    Ok(()) => {
                        self.live.insert(key);
                    }
                    Err(e) => warn!(effect = %key, error = %e, "effect create failed"),
                }
            }
            EffectRequest::Update { key, payload } => {
                if !self.live.contains(&key) {
                    debug!(effect = %key, "effect update skipped: not live");
                    return;
                }
                if let Err(e) = self.sink.update_effect(key, &payload).await {
                    warn!(effect = %key, error = %e, "effect update failed");
                    self.live.remove(&key);
                }
            }
            EffectRequest::Delete { key } => {
                if self.live.contains(&key) {
                    self.delete(key).await;
                }
            }
            EffectRequest::ClearAgent { agent } => {
                for kind in EffectKind::ALL {
                    let key = EffectKey::new(agent, kind);
                    if self.live.contains(&key) {
                        self.delete(key).await;
                    }
                }
            }
            EffectRequest::ClearAll => {
                let keys: Vec<EffectKey> = self.live.iter().copied().collect();
                for key in keys {
                    self.delete(key).await;
                }
            }
        }
    }

    /// Delete a live visual.  It is gone afterwards even if the sink failed.
    async fn delete(&mut self, key: EffectKey) {
        self.live.remove(&key);
        if let Err(e) = self.sink.delete_effect(key).await {
            warn!(effect = %key, error = %e, "effect delete failed");
        }
    }
}
