//! # utreexo-stump
//!
//! A dynamic, hash-based accumulator in the style of [Utreexo](https://eprint.iacr.org/2019/611.pdf).
//! It commits to a large, frequently changing set (e.g. the UTXO set) using a logarithmic
//! amount of space. Elements can be added and deleted, and membership of any batch of them can
//! be proven with a single, deduplicated proof.
//!
//! The accumulator state is a [Stump](accumulator::stump::Stump): the roots of a forest of
//! perfect binary trees and the number of leaves ever added. Proofs can be verified, updated
//! to follow the accumulator as it changes, narrowed to a subset of their targets, and
//! serialized.
//!
//! Nothing in this library installs a logger. Events are emitted through `tracing`, so
//! callers pick a subscriber if they want to see them.
//!
//! For more information, check each module's documentation.

pub mod accumulator;
