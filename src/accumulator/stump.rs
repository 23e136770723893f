//! A [Stump] is the accumulator itself: the roots of every tree in the forest and how many
//! leaves were ever added. It never holds leaves, so it can only check membership given a
//! [Proof] for it.
//!
//! A [Stump] is an immutable value. [Stump::modify] returns a new one instead of changing
//! the old, so any number of threads can verify against a snapshot while a single writer
//! computes the next state.
//! # Example
//! ```
//! use std::str::FromStr;
//!
//! use utreexo_stump::accumulator::node_hash::BitcoinNodeHash;
//! use utreexo_stump::accumulator::proof::Proof;
//! use utreexo_stump::accumulator::stump::Stump;
//!
//! let s = Stump::new();
//! let utxos = vec![BitcoinNodeHash::from_str(
//!     "b151a956139bb821d4effa34ea95c17560e0135d1e4661fc23cedc3af49dac42",
//! )
//! .unwrap()];
//! let (s, _) = s.modify(&utxos, &[], &Proof::default()).unwrap();
//! assert_eq!(s.get_roots(), &utxos[..]);
//! assert_eq!(s.num_leaves(), 1);
//! ```
use std::fmt::Display;

#[cfg(feature = "with-serde")]
use serde::Deserialize;
#[cfg(feature = "with-serde")]
use serde::Serialize;
use tracing::debug;
use tracing::error;

use super::error::UtreexoError;
use super::node_hash::AccumulatorHash;
use super::node_hash::BitcoinNodeHash;
use super::proof::Proof;
use super::util;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub struct Stump<Hash: AccumulatorHash = BitcoinNodeHash> {
    leaves: u64,
    roots: Vec<Hash>,
}

/// Everything a [Proof] needs to follow a single [Stump::modify] call. See [Proof::update].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub struct UpdateData<Hash: AccumulatorHash = BitcoinNodeHash> {
    /// Leaf count before the modification
    pub(crate) prev_num_leaves: u64,
    /// Nodes written by the addition pass, at their final position
    pub(crate) new_add: Vec<(u64, Hash)>,
    /// New values for the ancestors of every deleted node, in the forest before the
    /// modification. An empty hash means the node went away
    pub(crate) new_del: Vec<(u64, Hash)>,
    /// Empty roots that additions have written over
    pub(crate) to_destroy: Vec<u64>,
}

impl<Hash: AccumulatorHash> UpdateData<Hash> {
    pub fn prev_num_leaves(&self) -> u64 {
        self.prev_num_leaves
    }
}

impl Stump {
    /// Creates an empty Stump
    ///# Example
    /// ```
    /// use utreexo_stump::accumulator::stump::Stump;
    /// let s = Stump::new();
    /// assert_eq!(s.num_leaves(), 0);
    /// assert!(s.get_roots().is_empty());
    /// ```
    pub fn new() -> Self {
        Stump {
            leaves: 0,
            roots: Vec::new(),
        }
    }
}

impl<Hash: AccumulatorHash> Stump<Hash> {
    /// Creates an empty Stump over a custom hash type
    pub fn new_empty() -> Self {
        Stump {
            leaves: 0,
            roots: Vec::new(),
        }
    }

    /// Rebuilds a Stump from roots persisted by the caller. There must be exactly one root
    /// per tree in a forest of `leaves` leaves.
    pub fn from_roots(roots: Vec<Hash>, leaves: u64) -> Result<Self, UtreexoError> {
        util::check_num_leaves(leaves)?;
        if roots.len() != util::num_roots(leaves) {
            return Err(UtreexoError::InvalidArgument(format!(
                "a forest with {leaves} leaves has {} roots, got {}",
                util::num_roots(leaves),
                roots.len()
            )));
        }

        Ok(Stump { leaves, roots })
    }

    /// The roots, tallest tree first. A fully deleted tree has an empty root.
    pub fn get_roots(&self) -> &[Hash] {
        &self.roots
    }

    /// How many leaves were ever added. Deletions don't decrease this.
    pub fn num_leaves(&self) -> u64 {
        self.leaves
    }

    /// Checks `proof` for `del_hashes` against this Stump. See [Proof::verify].
    pub fn verify(&self, proof: &Proof<Hash>, del_hashes: &[Hash]) -> Result<bool, UtreexoError> {
        proof.verify(del_hashes, &self.roots, self.leaves)
    }

    /// Modify is the external API to change the accumulator state. Since order
    /// matters, you can only modify, providing a list of utxos to be added,
    /// and txos to be removed, along with it's proof. Either may be
    /// empty. Deletions always happen before additions.
    ///
    /// Returns the new Stump, plus the [UpdateData] needed to update proofs held against
    /// this one. On error nothing changes, `self` is never touched.
    ///# Example
    /// ```
    /// use std::str::FromStr;
    ///
    /// use utreexo_stump::accumulator::node_hash::BitcoinNodeHash;
    /// use utreexo_stump::accumulator::proof::Proof;
    /// use utreexo_stump::accumulator::stump::Stump;
    ///
    /// let s = Stump::new();
    /// let utxos = vec![
    ///     BitcoinNodeHash::from_str(
    ///         "b151a956139bb821d4effa34ea95c17560e0135d1e4661fc23cedc3af49dac42",
    ///     )
    ///     .unwrap(),
    ///     BitcoinNodeHash::from_str(
    ///         "d3bd63d53c5a70050a28612a2f4b2019f40951a653ae70736d93745efb1124fa",
    ///     )
    ///     .unwrap(),
    /// ];
    /// let (s, _) = s.modify(&utxos, &[], &Proof::default()).unwrap();
    ///
    /// // Spend the first one
    /// let proof = Proof::new(vec![0], vec![utxos[1]]);
    /// let (s, _) = s.modify(&[], &[utxos[0]], &proof).unwrap();
    /// assert_eq!(s.num_leaves(), 2);
    /// assert_eq!(s.get_roots(), &[utxos[1]]);
    /// ```
    pub fn modify(
        &self,
        utxos: &[Hash],
        del_hashes: &[Hash],
        proof: &Proof<Hash>,
    ) -> Result<(Stump<Hash>, UpdateData<Hash>), UtreexoError> {
        let leaves = self
            .leaves
            .checked_add(utxos.len() as u64)
            .ok_or_else(|| {
                UtreexoError::InvalidArgument(format!(
                    "adding {} leaves to {} overflows the leaf count",
                    utxos.len(),
                    self.leaves
                ))
            })?;
        util::check_num_leaves(leaves)?;

        debug!(
            num_leaves = self.leaves,
            additions = utxos.len(),
            deletions = del_hashes.len(),
            "modifying stump"
        );

        let (roots, new_del) = self.remove(del_hashes, proof)?;
        let (roots, new_add, to_destroy) = Self::add(roots, utxos, self.leaves)?;

        if roots.len() != util::num_roots(leaves) {
            error!(
                num_leaves = leaves,
                roots = roots.len(),
                "root count doesn't match the leaf count after modify"
            );
            return Err(UtreexoError::Accumulator(format!(
                "{} roots for {leaves} leaves",
                roots.len()
            )));
        }

        let update_data = UpdateData {
            prev_num_leaves: self.leaves,
            new_add,
            new_del,
            to_destroy,
        };

        Ok((Stump { leaves, roots }, update_data))
    }

    /// Rewinds old tree state, this should be used in case of reorgs.
    /// Takes the ownership over `old_state` and replaces `self` with it, the same as
    /// `*self = old_state`. Nothing is recomputed, and no other method changes a Stump in
    /// place.
    ///# Example
    /// ```
    /// use utreexo_stump::accumulator::proof::Proof;
    /// use utreexo_stump::accumulator::stump::Stump;
    /// let s_old = Stump::new();
    /// let mut s_new = Stump::new();
    ///
    /// let s_old = s_old.modify(&[], &[], &Proof::default()).unwrap().0;
    /// s_new = s_old.clone();
    /// s_new = s_new.modify(&[], &[], &Proof::default()).unwrap().0;
    ///
    /// // A reorg happened
    /// s_new.undo(s_old);
    /// ```
    pub fn undo(&mut self, old_state: Stump<Hash>) {
        self.leaves = old_state.leaves;
        self.roots = old_state.roots;
    }

    /// Deletes every target of `proof` from the forest. Returns the new roots and the new
    /// value of each affected node.
    #[allow(clippy::type_complexity)]
    fn remove(
        &self,
        del_hashes: &[Hash],
        proof: &Proof<Hash>,
    ) -> Result<(Vec<Hash>, Vec<(u64, Hash)>), UtreexoError> {
        if del_hashes.is_empty() && proof.n_targets() == 0 {
            return Ok((self.roots.clone(), vec![]));
        }

        let (new_del, computed_roots) = proof.calculate_hashes_delete(del_hashes, self.leaves)?;

        let forest_rows = util::tree_rows(self.leaves);
        let mut roots = self.roots.clone();
        for (pos, old_root, new_root) in computed_roots {
            let idx = util::root_index(pos, self.leaves, forest_rows);
            match roots.get_mut(idx) {
                Some(root) if *root == old_root => *root = new_root,
                _ => {
                    debug!(position = pos, "deletion proof doesn't match root {idx}");
                    return Err(UtreexoError::InvalidProof(format!(
                        "computed root at position {pos} doesn't match the accumulator"
                    )));
                }
            }
        }

        Ok((roots, new_del))
    }

    /// Adds new leafs into the root. Returns the new roots, every node written along
    /// the way and the empty roots that got written over.
    #[allow(clippy::type_complexity)]
    fn add(
        mut roots: Vec<Hash>,
        utxos: &[Hash],
        mut leaves: u64,
    ) -> Result<(Vec<Hash>, Vec<(u64, Hash)>, Vec<u64>), UtreexoError> {
        let after_rows = util::tree_rows(leaves + utxos.len() as u64);
        let to_destroy = util::roots_to_destroy(utxos.len() as u64, leaves, &roots);
        let mut new_add = Vec::with_capacity(utxos.len() * 2);

        for utxo in utxos {
            Self::add_single(&mut roots, &mut new_add, *utxo, leaves, after_rows)?;
            leaves += 1;
        }

        new_add.sort();
        new_add.dedup();

        Ok((roots, new_add, to_destroy))
    }

    fn add_single(
        roots: &mut Vec<Hash>,
        new_add: &mut Vec<(u64, Hash)>,
        node: Hash,
        leaves: u64,
        forest_rows: u8,
    ) -> Result<(), UtreexoError> {
        let mut h = 0;
        let mut pos = leaves;
        // Iterates over roots, if we find a root that is not empty, we concatenate with
        // the one we are adding and create new root, leaving this position empty. Stops
        // when find an empty root.

        // You can say if a root is empty, by looking a the binary representations of the
        // number of leafs. If the h'th bit is one, then this position is occupied, empty
        // otherwise.
        let mut to_add = node;
        new_add.push((pos, to_add));

        while (leaves >> h) & 1 == 1 {
            let root = roots.pop().ok_or_else(|| {
                error!(num_leaves = leaves, "ran out of roots while adding");
                UtreexoError::Accumulator(format!("missing root at row {h} for {leaves} leaves"))
            })?;

            if root.is_empty() {
                // Nothing to hash with, our subtree moves up and takes the empty root's place
                let del = util::sibling(pos);
                for (node_pos, _) in new_add.iter_mut() {
                    if *node_pos == pos || util::is_ancestor(pos, *node_pos, forest_rows) {
                        *node_pos = util::calc_next_pos(*node_pos, del, forest_rows)?;
                    }
                }
            } else {
                new_add.push((util::sibling(pos), root));
                to_add = Hash::parent_hash(&root, &to_add);
                new_add.push((util::parent(pos, forest_rows), to_add));
            }

            pos = util::parent(pos, forest_rows);
            h += 1;
        }

        roots.push(to_add);
        Ok(())
    }
}

impl<Hash: AccumulatorHash> Display for Stump<Hash> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Stump {{ leaves: {}, roots: [", self.leaves)?;
        for root in self.roots.iter() {
            writeln!(f, "    {root:?},")?;
        }
        write!(f, "] }}")
    }
}
