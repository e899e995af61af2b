//! synchronizer configuration, loaded from a TOML file by the cli crate via
//! plain `serde::Deserialize` rather than a dedicated config-file crate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// protocol-level tree depths and per-epoch constants; these are properties
/// of the deployed contract, not of this crate, so they are supplied at
/// construction time rather than hardcoded
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParams {
    /// depth of the global state tree
    pub gst_depth: usize,
    /// depth of the epoch tree and user-state tree
    pub epoch_tree_depth: usize,
    pub ust_depth: usize,
    /// `numEpochKeyNoncePerEpoch`
    pub epoch_key_nonces: usize,
    /// length of an epoch in seconds
    pub epoch_length_secs: u64,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            gst_depth: 16,
            epoch_tree_depth: 8,
            ust_depth: 8,
            epoch_key_nonces: 3,
            epoch_length_secs: 300,
        }
    }
}

/// synchronizer runtime configuration; durations are kept as seconds on the
/// wire so the TOML file stays plain numbers rather than nested tables
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    /// how often the ingestor polls the chain when idle
    pub poll_interval_secs: u64,
    /// number of confirmations a log must have before it is considered final;
    /// re-org handling deeper than this is out of scope (§1)
    pub confirmation_depth: u64,
    pub rpc_timeout_secs: u64,
    pub prover_timeout_secs: u64,
    pub db_path: String,
    pub contract_address: String,
    pub chain_id: u64,
    pub protocol: ProtocolParams,
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    pub fn prover_timeout(&self) -> Duration {
        Duration::from_secs(self.prover_timeout_secs)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 1,
            confirmation_depth: 0,
            rpc_timeout_secs: 10,
            prover_timeout_secs: 10,
            db_path: "unirep.db".to_string(),
            contract_address: "0x0000000000000000000000000000000000000000".to_string(),
            chain_id: 1,
            protocol: ProtocolParams::default(),
        }
    }
}
