//! [BitcoinNodeHash] is the digest type committed to by the accumulator. It wraps a
//! [[u8; 32]], and adds two sentinel states the algorithms need: an empty hash for deleted
//! nodes and a placeholder for nodes that exist but whose value is irrelevant.
//! # Examples
//! Building from a str
//! ```
//! use std::str::FromStr;
//!
//! use utreexo_stump::accumulator::node_hash::BitcoinNodeHash;
//! let hash = BitcoinNodeHash::from_str(
//!     "6e340b9cffb37a989ca544e6bb780a2c78901d3fb33738768511a30617afa01d",
//! )
//! .unwrap();
//! assert_eq!(
//!     hash.to_string().as_str(),
//!     "6e340b9cffb37a989ca544e6bb780a2c78901d3fb33738768511a30617afa01d"
//! );
//! ```
//! Building from an array
//! ```
//! use utreexo_stump::accumulator::node_hash::BitcoinNodeHash;
//! let hash1 = BitcoinNodeHash::new([0; 32]);
//! // ... or ...
//! let hash2 = BitcoinNodeHash::from([0; 32]);
//! assert_eq!(hash1, hash2);
//! ```
//!
//! Computing a parent hash (i.e a hash of two nodes concatenated)
//! ```
//! use std::str::FromStr;
//!
//! use utreexo_stump::accumulator::node_hash::AccumulatorHash;
//! use utreexo_stump::accumulator::node_hash::BitcoinNodeHash;
//! let left = BitcoinNodeHash::new([0; 32]);
//! let right = BitcoinNodeHash::new([1; 32]);
//! let parent = BitcoinNodeHash::parent_hash(&left, &right);
//! let expected_parent = BitcoinNodeHash::from_str(
//!     "34e33ca0c40b7bd33d28932ca9e35170def7309a3bf91ecda5e1ceb067548a12",
//! )
//! .unwrap();
//! assert_eq!(parent, expected_parent);
//! ```
use std::convert::TryFrom;
use std::fmt::Debug;
use std::fmt::Display;
use std::ops::Deref;
use std::str::FromStr;

use bitcoin_hashes::hex;
use bitcoin_hashes::sha256;
use bitcoin_hashes::sha512_256;
use bitcoin_hashes::Hash;
use bitcoin_hashes::HashEngine;
#[cfg(feature = "with-serde")]
use serde::Deserialize;
#[cfg(feature = "with-serde")]
use serde::Serialize;

/// Everything the accumulator needs from a hash type. [Stump](super::stump::Stump),
/// [Proof](super::proof::Proof) and [UpdateData](super::stump::UpdateData) are generic over
/// it, so a different digest (e.g. one that is cheap inside a circuit) can be plugged in.
pub trait AccumulatorHash:
    Copy + Clone + Ord + Debug + Display + std::hash::Hash + Default + 'static
{
    fn is_empty(&self) -> bool;
    fn empty() -> Self;
    fn is_placeholder(&self) -> bool;
    fn placeholder() -> Self;
    /// Combines two children into their parent. Never called with an empty child.
    fn parent_hash(left: &Self, right: &Self) -> Self;
    fn write<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: std::io::Write;
    fn read<R>(reader: &mut R) -> std::io::Result<Self>
    where
        R: std::io::Read;
}

#[derive(Eq, PartialEq, Copy, Clone, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
/// A 32 byte node hash, or one of the two sentinels.
/// # Example
/// ```
/// use utreexo_stump::accumulator::node_hash::BitcoinNodeHash;
/// let hash = BitcoinNodeHash::new([0; 32]);
/// assert_eq!(
///     hash.to_string().as_str(),
///     "0000000000000000000000000000000000000000000000000000000000000000"
/// );
/// ```
#[derive(Default)]
pub enum BitcoinNodeHash {
    #[default]
    Empty,
    Placeholder,
    Some([u8; 32]),
}

impl Deref for BitcoinNodeHash {
    type Target = [u8; 32];

    fn deref(&self) -> &Self::Target {
        match self {
            BitcoinNodeHash::Some(ref inner) => inner,
            _ => &[0; 32],
        }
    }
}

fn write_hex(f: &mut std::fmt::Formatter<'_>, inner: &[u8; 32]) -> std::fmt::Result {
    for byte in inner.iter() {
        write!(f, "{byte:02x}")?;
    }
    Ok(())
}

impl Display for BitcoinNodeHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        if let BitcoinNodeHash::Some(ref inner) = self {
            write_hex(f, inner)
        } else {
            write!(f, "empty")
        }
    }
}

impl Debug for BitcoinNodeHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        match self {
            BitcoinNodeHash::Empty => write!(f, "empty"),
            BitcoinNodeHash::Placeholder => write!(f, "placeholder"),
            BitcoinNodeHash::Some(ref inner) => write_hex(f, inner),
        }
    }
}

impl From<sha512_256::Hash> for BitcoinNodeHash {
    fn from(hash: sha512_256::Hash) -> Self {
        BitcoinNodeHash::Some(hash.to_byte_array())
    }
}

impl From<sha256::Hash> for BitcoinNodeHash {
    fn from(hash: sha256::Hash) -> Self {
        BitcoinNodeHash::Some(hash.to_byte_array())
    }
}

impl From<[u8; 32]> for BitcoinNodeHash {
    fn from(hash: [u8; 32]) -> Self {
        BitcoinNodeHash::Some(hash)
    }
}

impl From<&[u8; 32]> for BitcoinNodeHash {
    fn from(hash: &[u8; 32]) -> Self {
        BitcoinNodeHash::Some(*hash)
    }
}

#[cfg(test)]
impl TryFrom<&str> for BitcoinNodeHash {
    type Error = hex::HexToArrayError;
    fn try_from(hash: &str) -> Result<Self, Self::Error> {
        // Test vectors spell empty roots as 64 zeros
        if hash == "0000000000000000000000000000000000000000000000000000000000000000" {
            return Ok(BitcoinNodeHash::Empty);
        }

        let hash = hex::FromHex::from_hex(hash)?;
        Ok(BitcoinNodeHash::Some(hash))
    }
}

#[cfg(not(test))]
impl TryFrom<&str> for BitcoinNodeHash {
    type Error = hex::HexToArrayError;
    fn try_from(hash: &str) -> Result<Self, Self::Error> {
        let inner = hex::FromHex::from_hex(hash)?;
        Ok(BitcoinNodeHash::Some(inner))
    }
}

impl FromStr for BitcoinNodeHash {
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BitcoinNodeHash::try_from(s)
    }

    type Err = hex::HexToArrayError;
}

impl BitcoinNodeHash {
    /// Creates a new hash from a 32 byte array.
    pub fn new(inner: [u8; 32]) -> Self {
        BitcoinNodeHash::Some(inner)
    }
}

impl AccumulatorHash for BitcoinNodeHash {
    fn is_empty(&self) -> bool {
        matches!(self, BitcoinNodeHash::Empty)
    }

    /// Creates an empty hash. This is used to represent deleted nodes and roots of fully
    /// deleted trees.
    /// # Example
    /// ```
    /// use utreexo_stump::accumulator::node_hash::AccumulatorHash;
    /// use utreexo_stump::accumulator::node_hash::BitcoinNodeHash;
    /// let hash = BitcoinNodeHash::empty();
    /// assert!(hash.is_empty());
    /// ```
    fn empty() -> Self {
        BitcoinNodeHash::Empty
    }

    /// SHA-512/256 over `left || right`. Leaves are SHA-256 digests, so using a different
    /// function for internal nodes keeps the two domains apart.
    fn parent_hash(left: &Self, right: &Self) -> Self {
        let mut hash = sha512_256::Hash::engine();
        hash.input(&**left);
        hash.input(&**right);
        sha512_256::Hash::from_engine(hash).into()
    }

    fn is_placeholder(&self) -> bool {
        matches!(self, BitcoinNodeHash::Placeholder)
    }

    /// A value that is known not to be empty, without being any real hash. Not to be
    /// confused with [BitcoinNodeHash::Empty].
    fn placeholder() -> Self {
        BitcoinNodeHash::Placeholder
    }

    /// Writes the raw 32 bytes. Sentinels have no wire form.
    fn write<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: std::io::Write,
    {
        match self {
            Self::Some(hash) => writer.write_all(hash),
            Self::Empty | Self::Placeholder => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("can't serialize a {self:?} hash"),
            )),
        }
    }

    fn read<R>(reader: &mut R) -> std::io::Result<Self>
    where
        R: std::io::Read,
    {
        let mut hash = [0; 32];
        reader.read_exact(&mut hash)?;
        Ok(Self::Some(hash))
    }
}
