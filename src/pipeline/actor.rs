//! Classification + resolution actor. Listings arrive on the bus, get
//! classified and resolved in parallel worker tasks, and leave as canonical
//! entities or audit records. Every stage is a pure function of one listing,
//! so the fan-out needs no locking and cancellation between listings is safe.

use crate::bus::types::Bus;
use crate::config::config::AppCfg;
use crate::core::types::{
    Actor, AuditRecord, CanonicalCardEntity, ListingQuality, RawListing,
};
use crate::filter::listing_filter::ListingFilter;
use crate::persistence::database::Database;
use crate::pipeline::stats::BatchStats;
use crate::resolver::resolver::Resolver;
use anyhow::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub struct PipelineActor {
    bus: Bus,
    shutdown: CancellationToken,
    filter: Arc<ListingFilter>,
    resolver: Arc<dyn Resolver>,
    min_quality: ListingQuality,
    workers: usize,
    db: Option<Database>,
}

/// Output of classifying one listing: either an accepted entity or the
/// audit record explaining the rejection.
enum Outcome {
    Accepted(Box<CanonicalCardEntity>),
    Rejected(AuditRecord),
}

impl PipelineActor {
    pub fn new(
        bus: Bus,
        shutdown: CancellationToken,
        cfg: &AppCfg,
        resolver: Arc<dyn Resolver>,
        db: Option<Database>,
    ) -> Self {
        Self {
            bus,
            shutdown,
            filter: Arc::new(ListingFilter::new(
                cfg.pipeline.low_price_floor,
                cfg.pipeline.high_price_ceiling,
            )),
            resolver,
            min_quality: cfg.pipeline.min_quality,
            workers: cfg.pipeline.workers.max(1),
            db,
        }
    }

    /// Classify one listing end to end. Pure and side-effect free; shared
    /// state is limited to the read-only filter tables and catalog snapshot.
    fn process_one(
        filter: &ListingFilter,
        resolver: &dyn Resolver,
        min_quality: ListingQuality,
        listing: &RawListing,
        stats: &mut BatchStats,
    ) -> Outcome {
        let result = filter.classify(listing);
        stats.record_filter(&result);

        if !result.is_valid || result.quality < min_quality {
            return Outcome::Rejected(ListingFilter::audit_record(listing, &result));
        }

        match resolver.resolve(listing, &result) {
            Some(entity) => {
                stats.record_resolution(true);
                Outcome::Accepted(Box::new(entity))
            }
            None => {
                // Explicit no-match: dropped rather than forced into a
                // best-guess identity.
                stats.record_resolution(false);
                Outcome::Rejected(ListingFilter::audit_record(listing, &result))
            }
        }
    }

    /// Fan-out/fan-in over one batch. Workers own disjoint chunks and local
    /// stats; the merge happens once all chunks are back.
    pub async fn process_batch(
        &self,
        listings: Vec<RawListing>,
    ) -> (Vec<CanonicalCardEntity>, Vec<AuditRecord>, BatchStats) {
        let chunk_size = listings.len().div_ceil(self.workers).max(1);
        let mut tasks = tokio::task::JoinSet::new();

        for chunk in listings.chunks(chunk_size) {
            let chunk: Vec<RawListing> = chunk.to_vec();
            let filter = self.filter.clone();
            let resolver = self.resolver.clone();
            let min_quality = self.min_quality;

            tasks.spawn_blocking(move || {
                let mut stats = BatchStats::default();
                let mut entities = Vec::new();
                let mut audits = Vec::new();
                for listing in &chunk {
                    match Self::process_one(&filter, resolver.as_ref(), min_quality, listing, &mut stats)
                    {
                        Outcome::Accepted(entity) => entities.push(*entity),
                        Outcome::Rejected(audit) => audits.push(audit),
                    }
                }
                (entities, audits, stats)
            });
        }

        let mut all_entities = Vec::new();
        let mut all_audits = Vec::new();
        let mut stats = BatchStats::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((entities, audits, worker_stats)) => {
                    all_entities.extend(entities);
                    all_audits.extend(audits);
                    stats.merge(&worker_stats);
                }
                Err(e) => warn!(?e, "pipeline worker panicked"),
            }
        }

        (all_entities, all_audits, stats)
    }
}

#[async_trait::async_trait]
impl Actor for PipelineActor {
    async fn run(self) -> Result<()> {
        let mut listings = self.bus.raw_listings.subscribe();
        let mut totals = BatchStats::default();
        // Micro-batching: drain whatever is queued and process it as one
        // fan-out pass, instead of a task round-trip per listing.
        let mut pending: Vec<RawListing> = Vec::new();

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("pipeline actor shutting down");
                    totals.log_summary();
                    return Ok(());
                }
                received = listings.recv() => {
                    match received {
                        Ok(listing) => {
                            pending.push((*listing).clone());
                            // Drain without waiting; the batch is whatever
                            // has accumulated.
                            while let Ok(more) = listings.try_recv() {
                                pending.push((*more).clone());
                            }
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                            warn!(missed = n, "pipeline lagged behind ingest");
                            continue;
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                            info!("listing topic closed");
                            totals.log_summary();
                            return Ok(());
                        }
                    }

                    let batch = std::mem::take(&mut pending);
                    let (entities, audits, stats) = self.process_batch(batch).await;
                    totals.merge(&stats);

                    for entity in entities {
                        if let Some(db) = &self.db {
                            if let Err(e) = db.save_entity(&entity).await {
                                error!(%e, sku = %entity.canonical_sku, "failed to persist entity");
                            }
                        }
                        self.bus.entities.publish(entity).await?;
                    }
                    for audit in audits {
                        if let Some(db) = &self.db {
                            if let Err(e) = db.save_audit(&audit).await {
                                error!(%e, "failed to persist audit record");
                            }
                        }
                        self.bus.audits.publish(audit).await?;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::CatalogEntry;
    use crate::resolver::catalog::{Catalog, CatalogHandle};
    use crate::resolver::resolver::RulesetResolver;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn listing(title: &str, price: f64) -> RawListing {
        RawListing {
            title: title.to_string(),
            description: String::new(),
            price: Decimal::try_from(price).ok(),
            condition: None,
            source: "test".to_string(),
            observed_at: Utc::now(),
        }
    }

    fn actor() -> PipelineActor {
        let catalog = Catalog::from_entries(vec![CatalogEntry {
            canonical_sku: "BRS-074-CHARIZARD_VMAX".to_string(),
            name: "Charizard VMAX".to_string(),
            set_code: "BRS".to_string(),
            card_number: "074".to_string(),
            rarity: "Secret Rare".to_string(),
        }]);
        let resolver = Arc::new(RulesetResolver::new(
            Arc::new(CatalogHandle::new(catalog)),
            85.0,
            100.0,
            20.0,
        ));
        PipelineActor::new(
            Bus::new(),
            CancellationToken::new(),
            &AppCfg::default(),
            resolver,
            None,
        )
    }

    #[tokio::test]
    async fn test_batch_separates_entities_and_audits() {
        let batch = vec![
            listing("Charizard VMAX 074/172 Brilliant Stars PSA 10", 299.99),
            listing("Pokemon TCGO Code Card Unused", 0.99),
            listing("Mystery grab bag of 50 random Pokemon cards", 25.0),
        ];

        let (entities, audits, stats) = actor().process_batch(batch).await;

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].canonical_sku, "BRS-074-CHARIZARD_VMAX");
        assert_eq!(audits.len(), 2);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.valid, 1);
        assert_eq!(stats.rejected, 2);
        assert_eq!(stats.resolved, 1);
    }

    #[tokio::test]
    async fn test_unresolvable_listing_is_audited_not_guessed() {
        let batch = vec![listing("Snorlax V Sleeping Giant Promo Near Mint", 12.0)];

        let (entities, audits, stats) = actor().process_batch(batch).await;

        assert!(entities.is_empty());
        assert_eq!(audits.len(), 1);
        assert_eq!(stats.unresolved, 1);
    }

    #[tokio::test]
    async fn test_below_min_quality_is_rejected_before_resolution() {
        // Scores junk territory: hype punctuation, as-is wording, wear.
        let batch = vec![listing(
            "Charizard VMAX 074/172 Brilliant Stars ??? as is no returns wear look at pics",
            299.99,
        )];

        let (entities, _audits, stats) = actor().process_batch(batch).await;

        assert!(entities.is_empty());
        assert_eq!(stats.resolved + stats.unresolved, 0);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let (entities, audits, stats) = actor().process_batch(Vec::new()).await;
        assert!(entities.is_empty());
        assert!(audits.is_empty());
        assert_eq!(stats.total, 0);
    }
}
