//! # PureCoin Consensus
//!
//! Proof-of-work difficulty and validation engine for PureCoin full nodes:
//! the component that decides, for every candidate block, how hard its proof
//! of work must be and whether a claimed proof satisfies that requirement.
//!
//! Every participating node must compute bit-identical results from this
//! crate or the network forks, so the implementation favors explicit checked
//! arithmetic over convenience: all target math runs in full 256-bit space,
//! and a step that would leave that space is a reported error, never a
//! silent wrap.
//!
//! The engine owns no chain state. It reads the block index through the
//! [`chain::ChainAncestry`] capability and receives the network's
//! [`params::ConsensusParams`] by reference; everything exported here is a
//! pure, synchronous function safe for concurrent use.

pub mod arith;
pub mod chain;
pub mod compact;
pub mod errors;
pub mod params;
pub mod pow;

pub use arith::Target;
pub use chain::{median_time_past, BlockHeader, ChainAncestry, HeaderChain};
pub use compact::{decode_compact, encode_compact, CompactBits, DecodedTarget};
pub use errors::ConsensusError;
pub use params::{ChainParams, ConsensusParams, GenesisIdentity, Network};
pub use pow::{
    calculate_next_work_required, check_proof_of_work, derive_target, get_next_work_required,
    permitted_difficulty_transition,
};
