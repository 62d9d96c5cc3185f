mod bus;
mod config;
mod core;
mod decision;
mod filter;
mod ingest;
mod persistence;
mod pipeline;
mod resolver;

use anyhow::{Context, Result};
use crate::bus::types::Bus;
use crate::config::config::{AppCfg, ResolverKind};
use crate::core::types::Actor;
use crate::decision::actor::DecisionActor;
use crate::decision::engine::DecisionEngine;
use crate::decision::forecast::{FileForecastProvider, ForecastProvider};
use crate::ingest::actor::IngestActor;
use crate::persistence::database::Database;
use crate::pipeline::actor::PipelineActor;
use crate::resolver::catalog::{Catalog, CatalogHandle};
use crate::resolver::resolver::{PassthroughResolver, Resolver, RulesetResolver};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let cfg = AppCfg::load("config.yml")?;

    // Root span for the supervisor/main thread
    let span = info_span!(
        "Supervisor",
        pid = %std::process::id(),
        version = env!("CARGO_PKG_VERSION"),
    );

    // logs below are inside "Supervisor"
    let _enter = span.enter();

    info!("Starting up");

    info!("Initializing shared pub/sub Bus");
    let bus = Bus::new();
    let shutdown = CancellationToken::new();

    let db = if cfg.database.enabled {
        info!("Connecting to database");
        Some(
            Database::new(&cfg.database.url)
                .await
                .context("initializing database")?,
        )
    } else {
        None
    };

    // No catalog means no resolution, but filtering still operates:
    // the resolver selection degrades rather than the whole pipeline.
    let resolver: Arc<dyn Resolver> = match cfg.pipeline.resolver {
        ResolverKind::Ruleset => {
            let catalog = Catalog::load(Path::new(&cfg.catalog.path))
                .context("loading reference catalog (fatal for the ruleset resolver)")?;
            Arc::new(RulesetResolver::new(
                Arc::new(CatalogHandle::new(catalog)),
                cfg.pipeline.min_resolution_confidence,
                cfg.pipeline.premium_price_floor,
                cfg.pipeline.mid_price_floor,
            ))
        }
        ResolverKind::Passthrough => {
            info!("Passthrough resolver selected; listings will be filtered but not resolved");
            Arc::new(PassthroughResolver)
        }
    };

    let provider: Arc<dyn ForecastProvider> =
        match FileForecastProvider::load(Path::new(&cfg.forecast.path)) {
            Ok(p) => Arc::new(p),
            Err(e) => {
                warn!(%e, "no forecast snapshot available, decisions will be skipped");
                Arc::new(FileForecastProvider::empty())
            }
        };

    info!("Building actors");
    let ingest = IngestActor::new(bus.clone(), cfg.ingest.clone(), shutdown.clone());
    let pipeline = PipelineActor::new(
        bus.clone(),
        shutdown.clone(),
        &cfg,
        resolver,
        db.clone(),
    );
    let decision = DecisionActor::new(
        bus.clone(),
        shutdown.clone(),
        DecisionEngine::new(cfg.decision.clone()),
        provider,
        db,
    );

    info!("Spawning actors");
    let mut actors = tokio::task::JoinSet::new();

    actors.spawn(pipeline.run().instrument(info_span!("Pipeline")));
    actors.spawn(decision.run().instrument(info_span!("Decision")));
    actors.spawn(ingest.run().instrument(info_span!("Ingest")));

    info!("Waiting for actors");

    tokio::select! {
        _ = async {
             while let Some(res) = actors.join_next().await {
                 match res {
                    Ok(Ok(()))  => info!("Actor exited cleanly"),
                    Ok(Err(e))  => error!(?e, "Actor returned error"),
                    Err(panic)  => error!(?panic, "Actor panicked/cancelled"),
                }
            }
        } => {  }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down supervisor loop");
            shutdown.cancel();
        }
    }

    info!("Waiting for graceful shutdown of actors");
    while let Some(res) = actors.join_next().await {
        match res {
            Ok(Ok(())) => info!("Actor exited cleanly"),
            Ok(Err(e)) => error!(?e, "Actor returned error"),
            Err(panic) => error!(?panic, "Actor panicked/cancelled"),
        }
    }

    info!("Supervisor exit");
    Ok(())
}
