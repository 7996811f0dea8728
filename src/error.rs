//! Crate-level error handling.
//!
//! Each concern owns its error enum, and every one of them folds
//! into the crate-level [`Error`] through [`impl_err!`](crate::impl_err).
//! Only conditions which make a mapping run meaningless are errors,
//! an unreachable path or an empty search result are regular values.

use thiserror::Error;

use crate::candidate::CandidateError;
use crate::config::ConfigError;
use crate::impl_err;
use crate::network::NetworkError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("network error: {0}")]
    Network(NetworkError),

    #[error("candidate error: {0}")]
    Candidate(CandidateError),

    #[error("configuration error: {0}")]
    Config(ConfigError),

    #[error("could not build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl_err!(NetworkError, Network);
impl_err!(CandidateError, Candidate);
impl_err!(ConfigError, Config);

pub type Result<T> = std::result::Result<T, Error>;
