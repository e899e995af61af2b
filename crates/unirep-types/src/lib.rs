//! shared domain types for the UniRep synchronizer
//!
//! kept dependency-free of storage/tree/chain concerns so every other crate
//! in the workspace can depend on it without cycles.

pub mod circuit;
pub mod field;
pub mod log;
pub mod topic;

pub use circuit::{
    Circuit, EpochKeySignals, ProcessAttestationsSignals, ReputationSignals, SignUpSignals,
    SignalError, StartTransitionSignals, UserStateTransitionSignals,
};
pub use field::{FieldElement, FieldError};
pub use log::{LogPosition, RawLog};
pub use topic::{Topic, TopicHash, TopicRegistry};
