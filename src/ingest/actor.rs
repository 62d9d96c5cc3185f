//! Ingestion boundary actor. Reads the JSONL batch handed over by the
//! collection side, enforces the ingestion contract (non-empty title,
//! non-negative-or-unknown price), drops duplicate observations, and
//! publishes surviving listings onto the bus. A malformed record is skipped
//! with a warning; it never aborts the rest of the batch.

use crate::bus::types::Bus;
use crate::config::config::IngestCfg;
use crate::core::types::{Actor, RawListing};
use crate::ingest::seen_cache::{SeenCache, SeenCacheConfig};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::num::NonZeroUsize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct IngestActor {
    bus: Bus,
    cfg: IngestCfg,
    shutdown: CancellationToken,
    seen: SeenCache,
}

impl IngestActor {
    pub fn new(bus: Bus, cfg: IngestCfg, shutdown: CancellationToken) -> Self {
        let seen = SeenCache::new(SeenCacheConfig {
            capacity: NonZeroUsize::new(cfg.seen_cache_capacity.max(1))
                .expect("capacity clamped to >= 1"),
            ttl_hours: cfg.seen_ttl_hours,
        });
        Self {
            bus,
            cfg,
            shutdown,
            seen,
        }
    }

    /// Contract checks for a single record. Returns the reason a record is
    /// rejected, None when it may enter the pipeline.
    fn rejection_reason(listing: &RawListing) -> Option<&'static str> {
        if listing.title.trim().is_empty() {
            return Some("empty title");
        }
        if listing.price.is_some_and(|p| p < Decimal::ZERO) {
            return Some("negative price");
        }
        None
    }
}

#[async_trait::async_trait]
impl Actor for IngestActor {
    async fn run(mut self) -> Result<()> {
        let data = tokio::fs::read_to_string(&self.cfg.batch_path)
            .await
            .with_context(|| format!("reading listing batch {}", self.cfg.batch_path))?;

        let mut published = 0usize;
        let mut skipped = 0usize;
        let mut duplicates = 0usize;

        for (line_no, line) in data.lines().enumerate() {
            if self.shutdown.is_cancelled() {
                info!("ingest cancelled mid-batch");
                break;
            }
            if line.trim().is_empty() {
                continue;
            }

            let listing: RawListing = match serde_json::from_str(line) {
                Ok(l) => l,
                Err(e) => {
                    warn!(line = line_no + 1, %e, "skipping malformed listing record");
                    skipped += 1;
                    continue;
                }
            };

            if let Some(reason) = Self::rejection_reason(&listing) {
                warn!(line = line_no + 1, reason, "listing rejected at ingest boundary");
                skipped += 1;
                continue;
            }

            if self.seen.is_duplicate(&listing) {
                duplicates += 1;
                continue;
            }

            self.bus.raw_listings.publish(listing).await?;
            published += 1;
        }

        info!(published, skipped, duplicates, "listing batch ingested");
        Ok(())
    }
}
