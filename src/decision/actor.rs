//! Scan actor joining resolved entities with external forecasts. One
//! recommendation per (entity, forecast) pair; entities without a forecast
//! are skipped, not defaulted.

use crate::bus::types::Bus;
use crate::core::types::Actor;
use crate::decision::engine::DecisionEngine;
use crate::decision::forecast::ForecastProvider;
use crate::persistence::database::Database;
use anyhow::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub struct DecisionActor {
    bus: Bus,
    shutdown: CancellationToken,
    engine: DecisionEngine,
    provider: Arc<dyn ForecastProvider>,
    db: Option<Database>,
}

impl DecisionActor {
    pub fn new(
        bus: Bus,
        shutdown: CancellationToken,
        engine: DecisionEngine,
        provider: Arc<dyn ForecastProvider>,
        db: Option<Database>,
    ) -> Self {
        Self {
            bus,
            shutdown,
            engine,
            provider,
            db,
        }
    }
}

#[async_trait::async_trait]
impl Actor for DecisionActor {
    async fn run(self) -> Result<()> {
        let mut entities = self.bus.entities.subscribe();

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("decision actor shutting down");
                    return Ok(());
                }
                received = entities.recv() => {
                    let entity = match received {
                        Ok(e) => e,
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                            error!(missed = n, "decision actor lagged behind pipeline");
                            continue;
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                            info!("entity topic closed");
                            return Ok(());
                        }
                    };

                    let Some((forecast, signals)) =
                        self.provider.forecast(&entity.canonical_sku).await
                    else {
                        debug!(sku = %entity.canonical_sku, "no forecast for entity, skipping");
                        continue;
                    };

                    let recommendation = self.engine.decide(&entity, &forecast, &signals);
                    info!(
                        sku = %entity.canonical_sku,
                        action = recommendation.action.as_str(),
                        risk = recommendation.risk_level.as_str(),
                        "recommendation"
                    );

                    if let Some(db) = &self.db {
                        if let Err(e) = db.save_recommendation(&recommendation).await {
                            error!(%e, sku = %entity.canonical_sku, "failed to persist recommendation");
                        }
                    }

                    self.bus.recommendations.publish(recommendation).await?;
                }
            }
        }
    }
}
