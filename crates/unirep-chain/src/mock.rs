//! an in-memory [`Chain`] fixture for tests: holds a fixed log set and tip,
//! with the ability to inject a one-shot failure to exercise retry paths

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use unirep_types::{LogPosition, RawLog, TopicHash};

use crate::{BlockRange, Chain, ChainError};

struct Inner {
    tip: u64,
    logs: Vec<RawLog>,
    pending_failure: Option<ChainError>,
    block_tx: broadcast::Sender<u64>,
}

pub struct MockChain {
    inner: Mutex<Inner>,
}

impl MockChain {
    pub fn new(tip: u64) -> Self {
        let (block_tx, _) = broadcast::channel(64);
        Self {
            inner: Mutex::new(Inner { tip, logs: Vec::new(), pending_failure: None, block_tx }),
        }
    }

    /// add a log to the fixture, keeping the set ordered by chain position
    pub fn push_log(&self, log: RawLog) {
        let mut inner = self.inner.lock().expect("mock chain mutex poisoned");
        inner.logs.push(log);
        inner.logs.sort_by_key(|l| l.position);
    }

    /// move the tip forward and notify any subscriber
    pub fn advance_to(&self, tip: u64) {
        let mut inner = self.inner.lock().expect("mock chain mutex poisoned");
        inner.tip = tip;
        let _ = inner.block_tx.send(tip);
    }

    /// the next call into this [`Chain`] will return `err` instead of
    /// succeeding; subsequent calls succeed normally
    pub fn fail_once(&self, err: ChainError) {
        self.inner.lock().expect("mock chain mutex poisoned").pending_failure = Some(err);
    }

    fn take_pending_failure(&self) -> Option<ChainError> {
        self.inner.lock().expect("mock chain mutex poisoned").pending_failure.take()
    }
}

#[async_trait]
impl Chain for MockChain {
    async fn get_block_number(&self) -> Result<u64, ChainError> {
        if let Some(err) = self.take_pending_failure() {
            return Err(err);
        }
        Ok(self.inner.lock().expect("mock chain mutex poisoned").tip)
    }

    async fn query_filter(&self, range: BlockRange, topics: &[TopicHash]) -> Result<Vec<RawLog>, ChainError> {
        if let Some(err) = self.take_pending_failure() {
            return Err(err);
        }
        let inner = self.inner.lock().expect("mock chain mutex poisoned");
        let lo = LogPosition { block_number: range.from, transaction_index: 0, log_index: 0 };
        let hi = LogPosition { block_number: range.to, transaction_index: u32::MAX, log_index: u32::MAX };
        Ok(inner
            .logs
            .iter()
            .filter(|log| log.position >= lo && log.position <= hi)
            .filter(|log| log.topic0().map(|t| topics.contains(&t)).unwrap_or(false))
            .cloned()
            .collect())
    }

    async fn subscribe_blocks(&self) -> Result<mpsc::Receiver<u64>, ChainError> {
        let mut rx = self.inner.lock().expect("mock chain mutex poisoned").block_tx.subscribe();
        let (tx, out_rx) = mpsc::channel(64);
        tokio::spawn(async move {
            while let Ok(block) = rx.recv().await {
                if tx.send(block).await.is_err() {
                    break;
                }
            }
        });
        Ok(out_rx)
    }
}
