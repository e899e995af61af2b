use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProverError {
    #[error("prover transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,
}
