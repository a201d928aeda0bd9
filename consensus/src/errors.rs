//! # Errors
//!
//! Error types returned by the consensus engine.
//!
//! Invalid compact encodings are deliberately absent here: they are expected,
//! frequent inputs on the validation path and surface as decode flags or
//! `Option`/`bool` results instead. The variants below mark caller-contract
//! or configuration problems that must not be absorbed silently.

use crate::params::Network;
use thiserror::Error;

/// Errors returned by the consensus engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConsensusError {
    /// Returned when an ancestor lookup asks for a height outside the
    /// queried block's chain.
    #[error("ancestor height {height} is outside [0, {tip_height}]")]
    HeightOutOfRange { height: i64, tip_height: i64 },

    /// Returned when a target multiply or divide would leave 256 bits.
    /// Wrapping instead of reporting would silently fork the network.
    #[error("target arithmetic overflowed 256 bits")]
    ArithmeticOverflow,

    /// Returned when a retarget scalar is outside the domain the target
    /// arithmetic is defined over.
    #[error("invalid scalar {0} in target arithmetic")]
    InvalidScalar(i64),

    /// Returned when chain parameters for the requested network have not
    /// been published.
    #[error("{0} network parameters are not implemented")]
    UnsupportedNetwork(Network),

    /// Returned when a network name cannot be parsed.
    #[error("unknown network name: {0}")]
    UnknownNetwork(String),

    /// Returned when a pushed header's previous-block hash does not match
    /// the current tip of the index.
    #[error("block header does not connect to the current tip")]
    DisconnectedHeader,
}
