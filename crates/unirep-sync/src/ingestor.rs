//! the event ingestor loop (§4.3): polls the chain collaborator, drains new
//! logs in strict total order, and runs each through its handler under one
//! store transaction per event.

use std::sync::Arc;

use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use unirep_chain::{BlockRange, Chain};
use unirep_prover::Prover;
use unirep_store::records::Epoch;
use unirep_store::Store;
use unirep_tree::{default_gst_leaf, Hasher, IncrementalTree};
use unirep_types::{LogPosition, RawLog, Topic, TopicRegistry};

use crate::config::SyncConfig;
use crate::dispatch::dispatch;
use crate::error::{Outcome, SyncError};
use crate::handlers::HandlerCtx;
use crate::observer::Observer;

/// ties the chain/store/tree/prover collaborators together and drives the
/// poll-fetch-sort-dispatch-commit cycle
pub struct Ingestor<H: Hasher> {
    chain: Arc<dyn Chain>,
    store: Store,
    prover: Arc<dyn Prover>,
    observer: Arc<dyn Observer>,
    registry: TopicRegistry,
    gst: IncrementalTree<H>,
    hasher: H,
    config: SyncConfig,
}

impl<H: Hasher> Ingestor<H> {
    /// opens (or resumes) the store's epoch-0 row if this is a fresh
    /// database, and rebuilds the in-memory GST for the current open epoch
    /// by replaying its persisted leaves
    pub fn new(
        store: Store,
        chain: Arc<dyn Chain>,
        prover: Arc<dyn Prover>,
        observer: Arc<dyn Observer>,
        hasher: H,
        config: SyncConfig,
    ) -> Result<Self, SyncError> {
        if store.latest_epoch()?.is_none() {
            store.transaction(|txn| txn.put_epoch(&Epoch::unsealed(0, 0)))?;
        }
        let current = store.latest_epoch()?.expect("just ensured an epoch row exists");

        let empty_leaf = default_gst_leaf(&hasher, config.protocol.ust_depth);
        let mut gst = IncrementalTree::new(config.protocol.gst_depth, empty_leaf, hasher.clone());
        for leaf in store.gst_leaves_for_epoch(current.number)? {
            gst.insert(leaf.hash)?;
        }

        Ok(Self {
            chain,
            store,
            prover,
            observer,
            registry: Topic::default_registry(),
            gst,
            hasher,
            config,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// runs until `stop` is cancelled; each iteration drains everything the
    /// chain currently has, then sleeps for the configured poll interval
    pub async fn run(&mut self, stop: CancellationToken) -> Result<(), SyncError> {
        let mut ticker = interval(self.config.poll_interval());
        loop {
            tokio::select! {
                _ = stop.cancelled() => return Ok(()),
                _ = ticker.tick() => {}
            }

            let drained = self.drain_once(&stop).await?;
            if !drained {
                continue;
            }
        }
    }

    /// one poll cycle: fetch everything new, process it in order, advance
    /// `latestCompleteBlock`. returns whether any log was processed.
    pub async fn drain_once(&mut self, stop: &CancellationToken) -> Result<bool, SyncError> {
        let tip = tokio::time::timeout(self.config.rpc_timeout(), self.chain.get_block_number())
            .await
            .map_err(|_| SyncError::Chain(unirep_chain::ChainError::Timeout))??;

        let cursor = self.store.get_sync_state()?;
        if tip <= cursor.latest_processed_block {
            return Ok(false);
        }

        let topics: Vec<_> = Topic::ALL.iter().map(|t| t.hash()).collect();
        let range = BlockRange { from: cursor.latest_processed_block.saturating_add(1), to: tip };
        let logs = tokio::time::timeout(self.config.rpc_timeout(), self.chain.query_filter(range, &topics))
            .await
            .map_err(|_| SyncError::Chain(unirep_chain::ChainError::Timeout))??;

        let floor = LogPosition {
            block_number: cursor.latest_processed_block,
            transaction_index: cursor.latest_processed_transaction_index,
            log_index: cursor.latest_processed_log_index,
        };
        let mut pending: Vec<RawLog> = logs.into_iter().filter(|log| log.position > floor).collect();
        pending.sort_by_key(|log| log.position);

        if pending.is_empty() {
            return Ok(false);
        }

        for log in pending {
            if stop.is_cancelled() {
                return Ok(true);
            }
            self.process_one(log).await?;
        }

        let mut state = self.store.get_sync_state()?;
        state.latest_complete_block = tip;
        self.store.transaction(|txn| txn.put_sync_state(&state))?;
        Ok(true)
    }

    /// decodes and decides the event, then commits its write and the
    /// cursor advance as one transaction (§4.3), applying the decision's
    /// live-tree mutation only once that transaction has durably committed.
    async fn process_one(&mut self, log: RawLog) -> Result<(), SyncError> {
        let topic_hash = *log.topic0().ok_or_else(|| {
            SyncError::UnknownTopic(unirep_types::TopicHash([0u8; 32]))
        })?;
        let topic = self.registry.resolve(&topic_hash).ok_or(SyncError::UnknownTopic(topic_hash))?;

        let ctx = HandlerCtx {
            store: &self.store,
            gst: &self.gst,
            hasher: &self.hasher,
            prover: self.prover.as_ref(),
            params: self.config.protocol,
            position: log.position,
            tx_hash: log.transaction_hash,
        };

        let decision = tokio::time::timeout(self.config.prover_timeout(), dispatch(&ctx, topic, &log.data))
            .await
            .map_err(|_| SyncError::Chain(unirep_chain::ChainError::Timeout))??;

        let mut state = self.store.get_sync_state()?;
        state.latest_processed_block = log.position.block_number;
        state.latest_processed_transaction_index = log.position.transaction_index;
        state.latest_processed_log_index = log.position.log_index;

        self.store.transaction(|txn| {
            if let Some(write) = &decision.write {
                write(txn)?;
            }
            txn.put_sync_state(&state)
        })?;

        if let Some(finalize) = decision.finalize {
            finalize(&mut self.gst)?;
        }

        if matches!(decision.outcome, Outcome::Rejected(_)) {
            tracing::debug!(?topic, outcome = ?decision.outcome, "event rejected");
        }
        self.observer.on_event(topic, log.position);
        Ok(())
    }
}
