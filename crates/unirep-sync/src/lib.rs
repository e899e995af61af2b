//! the UniRep event synchronizer: polls a chain collaborator, applies each
//! event to the durable store and in-memory global state tree in strict
//! order, and exposes the resulting mirror for downstream reads.

pub mod config;
pub mod decode;
mod dispatch;
pub mod error;
pub mod handlers;
mod ingestor;
pub mod observer;

pub use config::{ProtocolParams, SyncConfig};
pub use error::{Outcome, RejectReason, SyncError};
pub use handlers::HandlerCtx;
pub use ingestor::Ingestor;
pub use observer::{NoopObserver, Observer, TracingObserver};
