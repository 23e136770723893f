//! This module is the core of the library. It contains all the basic data structures to use the
//! accumulator: the [Stump](stump::Stump) holding its state, the [Proof](proof::Proof) proving
//! membership and the [UpdateData](stump::UpdateData) tying proofs to state changes.
//!
//! # [Stump](stump::Stump)
//! A Stump only holds the roots and the number of leaves in the accumulator. This is useful to
//! create lightweight nodes, that still validate, but are more compact, perfect to clients
//! running on low-power devices.
//!
//! ## Example
//! ```
//! use std::str::FromStr;
//!
//! use utreexo_stump::accumulator::node_hash::BitcoinNodeHash;
//! use utreexo_stump::accumulator::proof::Proof;
//! use utreexo_stump::accumulator::stump::Stump;
//! // Create a new empty Stump
//! let s = Stump::new();
//! // The newly create outputs
//! let utxos = vec![BitcoinNodeHash::from_str(
//!     "b151a956139bb821d4effa34ea95c17560e0135d1e4661fc23cedc3af49dac42",
//! )
//! .unwrap()];
//! // The spent outputs
//! let stxos = vec![];
//! // Modify the Stump, adding the new outputs and removing the spent ones, notice how
//! // it returns a new Stump, instead of modifying the old one. This is due to the fact
//! // that modify is a pure function, and none of it's operands are modified in the process.
//! let s = s.modify(&utxos, &stxos, &Proof::default());
//! assert!(s.is_ok());
//! assert_eq!(s.unwrap().0.get_roots(), &utxos[..]);
//! ```
//!
//! # Proof
//! A proof is a data structure that proves that a given element is in the accumulator. It is
//! composed of a list of positions, the targets, and a list of hashes. The hashes are the
//! siblings of the targets, and of their ancestors, that can't be computed from the targets
//! themselves.
//! ## Example
//! ```
//! use std::str::FromStr;
//!
//! use bitcoin_hashes::sha256;
//! use bitcoin_hashes::Hash;
//! use bitcoin_hashes::HashEngine;
//! use utreexo_stump::accumulator::node_hash::BitcoinNodeHash;
//! use utreexo_stump::accumulator::proof::Proof;
//! use utreexo_stump::accumulator::stump::Stump;
//! let s = Stump::new();
//! // Creates a tree with those values as leaves
//! let test_values: Vec<u8> = vec![0, 1, 2, 3, 4, 5, 6, 7];
//! // Targets are nodes witch we intend to prove
//! let targets = vec![0];
//!
//! // The hashes of the siblings of the targets, used to prove an element.
//! let proof_hashes = vec![
//!     BitcoinNodeHash::from_str(
//!         "4bf5122f344554c53bde2ebb8cd2b7e3d1600ad631c385a5d7cce23c7785459a",
//!     )
//!     .unwrap(),
//!     BitcoinNodeHash::from_str(
//!         "9576f4ade6e9bc3a6458b506ce3e4e890df29cb14cb5d3d887672aef55647a2b",
//!     )
//!     .unwrap(),
//!     BitcoinNodeHash::from_str(
//!         "29590a14c1b09384b94a2c0e94bf821ca75b62eacebc47893397ca88e3bbcbd7",
//!     )
//!     .unwrap(),
//! ];
//!
//! // Hashes of the leaves UTXOs we'll add to the accumulator
//! let mut hashes: Vec<BitcoinNodeHash> = Vec::new();
//! for i in test_values {
//!     let mut engine = sha256::Hash::engine();
//!     engine.input(&[i]);
//!     hashes.push(sha256::Hash::from_engine(engine).into())
//! }
//! // Add the UTXOs to the accumulator
//! let s = s.modify(&hashes, &[], &Proof::default()).unwrap().0;
//! // Create a proof for the targets
//! let p = Proof::new(targets, proof_hashes);
//! // Verify the proof
//! assert!(s.verify(&p, &[hashes[0]]).expect("This proof is valid"));
//! ```
pub mod error;
pub mod leaf_data;
pub mod node_hash;
pub mod proof;
pub mod stump;
pub mod util;
