//! Block-index access for the difficulty engine.
//!
//! The engine never owns chain storage. It reads heights, timestamps and
//! difficulty bits through the [`ChainAncestry`] capability, which the block
//! index storage engine implements. [`HeaderChain`] is the vector-backed
//! reference implementation used on the host side and throughout the tests.

use crate::compact::CompactBits;
use crate::errors::ConsensusError;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of trailing blocks feeding the median-time-past.
pub const MEDIAN_TIME_SPAN: usize = 11;

/// A block header in wire layout.
#[derive(Serialize, Deserialize, Eq, PartialEq, Clone, Debug, BorshDeserialize, BorshSerialize)]
pub struct BlockHeader {
    pub version: i32,
    pub prev_block_hash: [u8; 32],
    pub merkle_root: [u8; 32],
    pub time: u32,
    pub bits: CompactBits,
    pub nonce: u32,
}

impl BlockHeader {
    /// Computes the double SHA256 hash of the header.
    ///
    /// Fields are serialized in little-endian order (the 80-byte wire
    /// layout); the returned bytes are in internal order.
    pub fn block_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.version.to_le_bytes());
        hasher.update(self.prev_block_hash);
        hasher.update(self.merkle_root);
        hasher.update(self.time.to_le_bytes());
        hasher.update(self.bits.to_consensus().to_le_bytes());
        hasher.update(self.nonce.to_le_bytes());
        let first_hash = hasher.finalize_reset();

        hasher.update(first_hash);
        hasher.finalize().into()
    }
}

/// Read-only ancestry capability over the block index.
///
/// `Block` is a cheap handle obtained from this capability; accessor lookups
/// through a valid handle are infallible. Implementations must keep indexed
/// ancestor lookup consistent with repeated [`parent_of`] hops — the
/// provided [`ancestor_at_height`] is the reference traversal, and an
/// overriding implementation has to return the same block it would.
///
/// [`parent_of`]: ChainAncestry::parent_of
/// [`ancestor_at_height`]: ChainAncestry::ancestor_at_height
pub trait ChainAncestry {
    type Block: Copy;

    /// Height of the block; genesis is zero.
    fn height_of(&self, block: Self::Block) -> i64;

    /// Block timestamp in seconds since the epoch.
    fn time_of(&self, block: Self::Block) -> i64;

    /// Difficulty bits from the block's header.
    fn bits_of(&self, block: Self::Block) -> CompactBits;

    /// The parent handle, absent at genesis.
    fn parent_of(&self, block: Self::Block) -> Option<Self::Block>;

    /// The ancestor of `block` at `height`.
    ///
    /// Heights outside `[0, height_of(block)]` violate the caller contract
    /// and error with [`ConsensusError::HeightOutOfRange`].
    fn ancestor_at_height(
        &self,
        block: Self::Block,
        height: i64,
    ) -> Result<Self::Block, ConsensusError> {
        let tip_height = self.height_of(block);
        if height < 0 || height > tip_height {
            return Err(ConsensusError::HeightOutOfRange { height, tip_height });
        }

        let mut cursor = block;
        for _ in height..tip_height {
            cursor = self
                .parent_of(cursor)
                .ok_or(ConsensusError::HeightOutOfRange { height, tip_height })?;
        }
        Ok(cursor)
    }
}

/// Median of the timestamps of `block` and up to ten of its ancestors.
///
/// Individual block timestamps are not monotone; the median-time-past is the
/// monotone clock new block timestamps are validated against.
pub fn median_time_past<A: ChainAncestry>(chain: &A, block: A::Block) -> i64 {
    let mut timestamps = Vec::with_capacity(MEDIAN_TIME_SPAN);
    let mut cursor = Some(block);
    while let Some(b) = cursor {
        if timestamps.len() == MEDIAN_TIME_SPAN {
            break;
        }
        timestamps.push(chain.time_of(b));
        cursor = chain.parent_of(b);
    }

    timestamps.sort_unstable();
    timestamps[timestamps.len() / 2]
}

/// Vector-backed header index.
///
/// Stores a single best chain starting at genesis; handles are positions in
/// the vector, so height and ancestor lookups are O(1). The index is never
/// empty.
#[derive(Clone, Debug)]
pub struct HeaderChain {
    headers: Vec<BlockHeader>,
    hashes: Vec<[u8; 32]>,
}

impl HeaderChain {
    pub fn with_genesis(genesis: BlockHeader) -> Self {
        let hash = genesis.block_hash();
        HeaderChain {
            headers: vec![genesis],
            hashes: vec![hash],
        }
    }

    /// Appends a header that extends the current tip.
    pub fn push(&mut self, header: BlockHeader) -> Result<usize, ConsensusError> {
        if header.prev_block_hash != self.tip_hash() {
            return Err(ConsensusError::DisconnectedHeader);
        }
        let hash = header.block_hash();
        self.headers.push(header);
        self.hashes.push(hash);
        Ok(self.tip())
    }

    /// Handle of the best block.
    pub fn tip(&self) -> usize {
        self.headers.len() - 1
    }

    pub fn tip_height(&self) -> i64 {
        self.tip() as i64
    }

    pub fn tip_hash(&self) -> [u8; 32] {
        self.hashes[self.tip()]
    }

    pub fn header(&self, block: usize) -> &BlockHeader {
        &self.headers[block]
    }

    pub fn hash(&self, block: usize) -> [u8; 32] {
        self.hashes[block]
    }
}

impl ChainAncestry for HeaderChain {
    type Block = usize;

    fn height_of(&self, block: usize) -> i64 {
        block as i64
    }

    fn time_of(&self, block: usize) -> i64 {
        i64::from(self.headers[block].time)
    }

    fn bits_of(&self, block: usize) -> CompactBits {
        self.headers[block].bits
    }

    fn parent_of(&self, block: usize) -> Option<usize> {
        block.checked_sub(1)
    }

    fn ancestor_at_height(&self, block: usize, height: i64) -> Result<usize, ConsensusError> {
        let tip_height = self.height_of(block);
        if height < 0 || height > tip_height {
            return Err(ConsensusError::HeightOutOfRange { height, tip_height });
        }
        Ok(height as usize)
    }
}
