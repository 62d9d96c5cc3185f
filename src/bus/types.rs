use crate::core::types::{
    AuditRecord, CanonicalCardEntity, RawListing, Recommendation, SystemStatus,
};
use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::broadcast;

// ---------- Topic trait (broadcast semantics) ----------
#[async_trait::async_trait]
pub trait Topic<T>: Sync + Send + 'static {
    /// Publish a message to all subscribers.
    async fn publish(&self, msg: T) -> Result<()>;

    /// Subscribe to the stream (each subscriber has an independent cursor).
    fn subscribe(&self) -> broadcast::Receiver<Arc<T>>;
}

// ---------- Concrete broadcast topic ----------
// --- Broadcast topic: 1->N fanout (lossy under lag). Wrap payloads in Arc<T> to avoid Clone on T.
pub struct BroadcastTopic<T: Clone + Send + Sync + 'static> {
    tx: broadcast::Sender<Arc<T>>,
}

impl<T: Clone + Send + Sync + 'static> BroadcastTopic<T> {
    pub fn with_capacity(cap: usize) -> Self {
        let (tx, _rx) = broadcast::channel(cap);
        Self { tx }
    }
}

#[async_trait]
impl<T: Debug + Clone + Send + Sync + 'static> Topic<T> for BroadcastTopic<T> {
    async fn publish(&self, msg: T) -> Result<()> {
        // Non-blocking; errors only when no receivers (we can ignore or log)
        let _ = self.tx.send(Arc::new(msg));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<Arc<T>> {
        self.tx.subscribe()
    }
}

#[derive(Clone)]
pub struct Bus {
    pub raw_listings: Arc<dyn Topic<RawListing>>,
    pub entities: Arc<dyn Topic<CanonicalCardEntity>>,
    pub audits: Arc<dyn Topic<AuditRecord>>,
    pub recommendations: Arc<dyn Topic<Recommendation>>,
    pub system_status: Arc<dyn Topic<SystemStatus>>,
}

impl Bus {
    pub fn new() -> Self {
        let cap = 1024;

        Self {
            raw_listings: Arc::new(BroadcastTopic::<RawListing>::with_capacity(cap)),
            entities: Arc::new(BroadcastTopic::<CanonicalCardEntity>::with_capacity(cap)),
            audits: Arc::new(BroadcastTopic::<AuditRecord>::with_capacity(cap)),
            recommendations: Arc::new(BroadcastTopic::<Recommendation>::with_capacity(cap)),
            system_status: Arc::new(BroadcastTopic::<SystemStatus>::with_capacity(cap)),
        }
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
