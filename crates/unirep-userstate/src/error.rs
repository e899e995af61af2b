//! errors surfaced by the read model; `NotFound` is its own variant since a
//! missing record here is an ordinary query result, not a store fault

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserStateError {
    #[error("store error: {0}")]
    Store(#[from] unirep_store::StoreError),
    #[error("tree error: {0}")]
    Tree(#[from] unirep_tree::TreeError),
    #[error("not found: {0}")]
    NotFound(String),
}

pub type UserStateResult<T> = Result<T, UserStateError>;
