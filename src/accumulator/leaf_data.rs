//! The record committed to by each leaf. The accumulator itself only ever sees
//! [LeafData::leaf_hash], the record is what a wallet or a bridge keeps around to compute it.
//! # Example
//! ```
//! use utreexo_stump::accumulator::leaf_data::LeafData;
//! use utreexo_stump::accumulator::leaf_data::OutPoint;
//! use utreexo_stump::accumulator::leaf_data::TxOut;
//! use utreexo_stump::accumulator::proof::Proof;
//! use utreexo_stump::accumulator::stump::Stump;
//!
//! let leaf = LeafData::new(
//!     [0; 32],
//!     OutPoint {
//!         tx_id: [1; 32],
//!         vout: 0,
//!     },
//!     1,
//!     true,
//!     TxOut {
//!         value: 50_0000_0000,
//!         script_pubkey: vec![0x51],
//!     },
//! )
//! .unwrap();
//! let (s, _) = Stump::new()
//!     .modify(&[leaf.leaf_hash()], &[], &Proof::default())
//!     .unwrap();
//! assert_eq!(s.get_roots(), &[leaf.leaf_hash()]);
//! ```
use std::io::Write;

use bitcoin_hashes::sha256;
use bitcoin_hashes::Hash;
#[cfg(feature = "with-serde")]
use serde::Deserialize;
#[cfg(feature = "with-serde")]
use serde::Serialize;

use super::error::UtreexoError;
use super::node_hash::BitcoinNodeHash;

/// Points to an output of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub struct OutPoint {
    pub tx_id: [u8; 32],
    pub vout: u32,
}

/// The output itself: how much it holds and who can spend it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub struct TxOut {
    pub value: u64,
    pub script_pubkey: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub struct LeafData {
    /// A commitment to the block creating this utxo
    pub block_hash: [u8; 32],
    /// The utxo's outpoint
    pub prevout: OutPoint,
    /// Header code is a compact commitment to the block height and whether or not this
    /// transaction is coinbase. See [LeafData::header_code]
    pub header_code: u32,
    /// The actual utxo
    pub utxo: TxOut,
}

impl LeafData {
    pub fn new(
        block_hash: [u8; 32],
        prevout: OutPoint,
        height: u32,
        is_coinbase: bool,
        utxo: TxOut,
    ) -> Result<Self, UtreexoError> {
        Ok(LeafData {
            block_hash,
            prevout,
            header_code: LeafData::header_code(height, is_coinbase)?,
            utxo,
        })
    }

    /// Packs a block height and the coinbase flag as `height << 1 | is_coinbase`. Heights
    /// need to fit in 31 bits.
    pub fn header_code(height: u32, is_coinbase: bool) -> Result<u32, UtreexoError> {
        if height > u32::MAX >> 1 {
            return Err(UtreexoError::InvalidArgument(format!(
                "height {height} doesn't fit in a header code"
            )));
        }

        Ok((height << 1) | is_coinbase as u32)
    }

    pub fn height(&self) -> u32 {
        self.header_code >> 1
    }

    pub fn is_coinbase(&self) -> bool {
        self.header_code & 1 == 1
    }

    /// Writes the block hash, the outpoint, the header code, the value and the script, with
    /// integers in little-endian. The script goes last and isn't length prefixed.
    pub fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.to_bytes())
    }

    /// The SHA-256 of the serialized leaf, which is what goes into the accumulator.
    pub fn leaf_hash(&self) -> BitcoinNodeHash {
        sha256::Hash::hash(&self.to_bytes()).into()
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut ser = Vec::with_capacity(80 + self.utxo.script_pubkey.len());
        ser.extend_from_slice(&self.block_hash);
        ser.extend_from_slice(&self.prevout.tx_id);
        ser.extend_from_slice(&self.prevout.vout.to_le_bytes());
        ser.extend_from_slice(&self.header_code.to_le_bytes());
        ser.extend_from_slice(&self.utxo.value.to_le_bytes());
        ser.extend_from_slice(&self.utxo.script_pubkey);
        ser
    }
}
