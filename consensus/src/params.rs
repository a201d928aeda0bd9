//! Chain parameter registry.
//!
//! One immutable descriptor per supported network, selected by a [`Network`]
//! tag through a plain factory. The descriptor is built once at node
//! initialization and threaded by reference into every validation call;
//! there is no process-wide registry to mutate.
//!
//! Hard-coded consensus constants are self-checked during construction. A
//! failed check aborts initialization: a node built with an inconsistent
//! identity must not come up and start signing off on blocks.

use crate::arith::Target;
use crate::compact::CompactBits;
use crate::errors::ConsensusError;
use crate::pow::derive_target;
use hex_literal::hex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported network tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Main,
    Testnet,
    Regtest,
}

impl FromStr for Network {
    type Err = ConsensusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(Network::Main),
            "test" => Ok(Network::Testnet),
            "regtest" => Ok(Network::Regtest),
            _ => Err(ConsensusError::UnknownNetwork(s.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Main => write!(f, "main"),
            Network::Testnet => write!(f, "test"),
            Network::Regtest => write!(f, "regtest"),
        }
    }
}

/// Consensus rules for difficulty retargeting and proof-of-work checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsensusParams {
    /// The easiest target any block may use.
    pub pow_limit: Target,
    /// Seconds a full retarget window is expected to span.
    pub pow_target_timespan: i64,
    /// Expected seconds between consecutive blocks.
    pub pow_target_spacing: i64,
    /// Relaxed rule for test networks: accept any difficulty transition.
    pub pow_allow_min_difficulty_blocks: bool,
    /// Fixed-difficulty mode: retargeting always returns the previous bits.
    pub pow_no_retargeting: bool,
    /// Use the first block of the retarget window as the base of the new
    /// target instead of the last (BIP94 rule).
    pub enforce_bip94: bool,
}

impl ConsensusParams {
    /// Blocks per retarget window.
    pub fn difficulty_adjustment_interval(&self) -> i64 {
        self.pow_target_timespan / self.pow_target_spacing
    }
}

/// Identity of the network's genesis block, as published with the chain.
///
/// The hash and merkle root are supplied values; block and transaction
/// serialization live outside this crate, so they are validated by equality
/// against the hard-coded checkpoint anchors, not re-derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenesisIdentity {
    pub time: u32,
    pub nonce: u32,
    pub bits: CompactBits,
    /// Genesis block hash, internal byte order.
    pub hash: [u8; 32],
    /// Merkle root of the genesis transactions, internal byte order.
    pub merkle_root: [u8; 32],
}

/// Full per-network descriptor: consensus rules plus the network's wire and
/// address identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainParams {
    pub network: Network,
    /// Human-readable network identifier.
    pub network_id: &'static str,
    /// Message-start magic prepended to P2P frames.
    pub message_start: [u8; 4],
    pub default_port: u16,
    pub prune_after_height: u64,
    pub consensus: ConsensusParams,
    pub subsidy_halving_interval: i32,
    pub max_block_weight: u32,
    pub max_serialized_block_size: u32,
    /// Blocks of a signalling window required to lock in a rule change.
    pub rule_change_activation_threshold: u32,
    pub miner_confirmation_window: u32,
    pub genesis: GenesisIdentity,
    pub base58_pubkey_prefix: u8,
    pub base58_script_prefix: u8,
    pub base58_secret_prefix: u8,
    pub bech32_hrp: &'static str,
    /// Height-to-hash anchors the sync path refuses to reorg across.
    pub checkpoints: &'static [(i64, [u8; 32])],
}

/// Easiest mainnet target.
pub const MAINNET_POW_LIMIT: Target =
    Target::from_be_hex("00000fffffffffffffffffffffffffffffffffffffffffffffffffffffffffff");

// Display order 000007029b560c8b619ca32b1685d75ea8dfa884730180faa45bf7d2e4c0b9b9.
const MAINNET_GENESIS_HASH: [u8; 32] =
    hex!("b9b9c0e4d2f75ba4fa80017384a8dfa85ed785162ba39c618b0c569b02070000");

// Display order d131e7aaf25cc7c7bb5a2b18bc235a6a835f6d70e864ab6b7f28b934c1ec9d2c.
const MAINNET_GENESIS_MERKLE_ROOT: [u8; 32] =
    hex!("2c9decc134b9287f6bab64e8706d5f836a5a23bc182b5abbc7c75cf2aae731d1");

static MAINNET_CHECKPOINTS: [(i64, [u8; 32]); 1] = [(0, MAINNET_GENESIS_HASH)];

impl ChainParams {
    /// Builds the descriptor for `network`.
    ///
    /// Networks without published parameters are a recoverable
    /// [`ConsensusError::UnsupportedNetwork`]. An inconsistent descriptor
    /// for a supported network is fatal.
    pub fn new(network: Network) -> Result<ChainParams, ConsensusError> {
        let params = match network {
            Network::Main => Self::mainnet(),
            Network::Testnet | Network::Regtest => {
                return Err(ConsensusError::UnsupportedNetwork(network))
            }
        };
        params.assert_consensus_constants();
        tracing::debug!(network = %network, id = params.network_id, "selected chain parameters");
        Ok(params)
    }

    fn mainnet() -> ChainParams {
        ChainParams {
            network: Network::Main,
            network_id: "purecoin-main",
            message_start: [0xa1, 0xb2, 0xc3, 0xd4],
            default_port: 28333,
            prune_after_height: 100_000,
            consensus: ConsensusParams {
                pow_limit: MAINNET_POW_LIMIT,
                pow_target_timespan: 2016 * 45,
                pow_target_spacing: 45,
                pow_allow_min_difficulty_blocks: false,
                pow_no_retargeting: false,
                enforce_bip94: false,
            },
            subsidy_halving_interval: 210_000,
            max_block_weight: 500_000,
            max_serialized_block_size: 500_000,
            rule_change_activation_threshold: 1815, // 90% of 2016
            miner_confirmation_window: 2016,
            genesis: GenesisIdentity {
                time: 1_691_800_000,
                nonce: 214_878,
                bits: CompactBits::from_consensus(0x1e0f_fff0),
                hash: MAINNET_GENESIS_HASH,
                merkle_root: MAINNET_GENESIS_MERKLE_ROOT,
            },
            base58_pubkey_prefix: 28, // addresses start with 'P'
            base58_script_prefix: 50,
            base58_secret_prefix: 128,
            bech32_hrp: "pc",
            checkpoints: &MAINNET_CHECKPOINTS,
        }
    }

    /// Startup self-check of the hard-coded consensus constants.
    fn assert_consensus_constants(&self) {
        assert!(
            self.consensus.pow_target_spacing > 0
                && self.consensus.difficulty_adjustment_interval() > 0,
            "{}: degenerate retarget interval",
            self.network_id
        );
        assert!(
            derive_target(self.genesis.bits, self.consensus.pow_limit).is_some(),
            "{}: genesis difficulty bits fall outside the proof-of-work limit",
            self.network_id
        );
        assert!(
            self.genesis.hash != [0u8; 32] && self.genesis.merkle_root != [0u8; 32],
            "{}: missing genesis identity",
            self.network_id
        );
        let (height, hash) = self
            .checkpoints
            .first()
            .expect("checkpoint table is never empty");
        assert!(
            *height == 0 && *hash == self.genesis.hash,
            "{}: genesis checkpoint does not match the genesis block hash",
            self.network_id
        );
    }
}
