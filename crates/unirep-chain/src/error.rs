use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("rpc transport error: {0}")]
    Transport(String),

    #[error("chain reported block {reported} behind our cursor {cursor}, likely a reorg")]
    BehindCursor { reported: u64, cursor: u64 },

    #[error("request timed out")]
    Timeout,
}
