//! the chain collaborator: everything the synchronizer needs from the
//! deployed contract's event log, kept behind a trait so production wiring
//! can point at a real RPC/indexer endpoint while tests run against an
//! in-memory fixture

mod error;
pub mod mock;

pub use error::ChainError;

use async_trait::async_trait;
use unirep_types::{RawLog, TopicHash};

/// a half-open block range, inclusive of `from` and `to`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRange {
    pub from: u64,
    pub to: u64,
}

#[async_trait]
pub trait Chain: Send + Sync {
    /// the chain's current tip
    async fn get_block_number(&self) -> Result<u64, ChainError>;

    /// every log in `range` whose `topics[0]` is one of `topics`, in the
    /// chain's total order (ascending block, then transaction index, then
    /// log index)
    async fn query_filter(&self, range: BlockRange, topics: &[TopicHash]) -> Result<Vec<RawLog>, ChainError>;

    /// a channel that yields a new block number each time the chain
    /// advances; used to wake the ingestor between poll intervals instead
    /// of only relying on the timer
    async fn subscribe_blocks(&self) -> Result<tokio::sync::mpsc::Receiver<u64>, ChainError>;
}
