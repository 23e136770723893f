//! A proof is a collection of target positions and the hashes needed to recompute, from the
//! targets' own hashes, the roots of every tree holding a target. Hashes appear in a single
//! canonical order: row by row from the bottom up, ascending inside each row. Siblings that
//! can be computed from other targets are never included.
//!
//! Besides [Proof::verify], a proof can be kept valid across accumulator changes with
//! [Proof::update], narrowed to fewer targets with [Proof::get_proof_subset] and sent over the
//! wire with [Proof::serialize].
use std::collections::HashMap;
use std::io::Read;
use std::io::Write;

#[cfg(feature = "with-serde")]
use serde::Deserialize;
#[cfg(feature = "with-serde")]
use serde::Serialize;
use tracing::debug;
use tracing::error;

use super::error::UtreexoError;
use super::node_hash::AccumulatorHash;
use super::node_hash::BitcoinNodeHash;
use super::stump::UpdateData;
use super::util;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub struct Proof<Hash: AccumulatorHash = BitcoinNodeHash> {
    /// Targets are the positions of the nodes being proven, usually leaves. After some
    /// deletions a live leaf may sit above row 0. With the tree below, where 00 and 01 were
    /// deleted, the Targets can only consist of one of these: 02, 03, 04.
    ///```!
    ///  // 06
    ///  // |-------\
    ///  // 04      05
    ///  // |---\   |---\
    ///  //         02  03
    /// ```
    targets: Vec<u64>,

    /// All the nodes in the tree that are needed to hash up to the root of
    /// the tree. Here, the root is 06. If Targets are [00, 01], then Proof
    /// would be [05] as you need 04 and 05 to hash to 06. 04 can be calculated
    /// by hashing 00 and 01.
    ///```!
    /// // 06
    /// // |-------\
    /// // 04      05
    /// // |---\   |---\
    /// // 00  01  02  03
    /// ```
    hashes: Vec<Hash>,
}

/// The node hashes and the roots computed while walking a proof up
type NodesAndRoots<T> = (Vec<(u64, T)>, Vec<(u64, T)>);

impl<Hash: AccumulatorHash> Proof<Hash> {
    /// Creates a proof from a vector of target and hashes.
    /// `targets` are u64s and indicates the position of the leaves we are
    /// trying to prove.
    /// `hashes` are all hashes we need for computing the roots.
    ///
    /// Assuming a tree with leaf values [0, 1, 2, 3, 4, 5, 6, 7], we should see something like this:
    ///```!
    /// // 14
    /// // |-----------------\
    /// // 12                13
    /// // |---------\       |--------\
    /// // 08       09       10       11
    /// // |----\   |----\   |----\   |----\
    /// // 00   01  02   03  04   05  06   07
    /// ```
    /// If we are proving `00` (i.e. 00 is our target), then we need 01,
    /// 09 and 13's hashes, so we can compute 14 by hashing both siblings
    /// in each level (00 and 01, 08 and 09 and 12 and 13). Note that
    /// some hashes we can compute by ourselves, and are not present in the
    /// proof, in this case 00, 08, 12 and 14.
    ///
    /// Nothing is checked here, a malformed proof is only caught when used. See
    /// [Proof::try_new] for a checked version.
    /// # Example
    /// ```
    /// use utreexo_stump::accumulator::node_hash::BitcoinNodeHash;
    /// use utreexo_stump::accumulator::proof::Proof;
    /// let targets = vec![0];
    ///
    /// let mut proof_hashes = Vec::new();
    /// // For proving 0, we need 01, 09 and 13's hashes. 00, 08, 12 and 14 can be calculated
    /// // Fill `proof_hashes` up with all hashes
    /// proof_hashes.push(BitcoinNodeHash::new([1; 32]));
    /// let proof: Proof = Proof::new(targets, proof_hashes);
    /// assert_eq!(proof.n_targets(), 1);
    /// ```
    pub fn new(targets: Vec<u64>, hashes: Vec<Hash>) -> Self {
        Proof { targets, hashes }
    }

    /// Same as [Proof::new], but refuses targets that aren't strictly ascending.
    pub fn try_new(targets: Vec<u64>, hashes: Vec<Hash>) -> Result<Self, UtreexoError> {
        if let Some(pair) = targets.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(UtreexoError::InvalidArgument(format!(
                "targets must be strictly ascending, found {} before {}",
                pair[0], pair[1]
            )));
        }

        Ok(Proof { targets, hashes })
    }

    /// Returns how many targets this proof has
    pub fn n_targets(&self) -> usize {
        self.targets.len()
    }

    pub fn targets(&self) -> &[u64] {
        &self.targets
    }

    pub fn hashes(&self) -> &[Hash] {
        &self.hashes
    }

    /// Public interface for verifying proofs. Returns a result with a bool or an Error
    /// True means the proof is true given the current roots, false means the proof is
    /// not valid given the current roots. An error means the proof is malformed, and
    /// couldn't be valid against any accumulator with `num_leaves` leaves.
    ///# Examples
    /// ```
    /// use bitcoin_hashes::sha256::Hash as Sha256;
    /// use bitcoin_hashes::Hash;
    /// use bitcoin_hashes::HashEngine;
    /// use std::str::FromStr;
    /// use utreexo_stump::accumulator::node_hash::BitcoinNodeHash;
    /// use utreexo_stump::accumulator::proof::Proof;
    /// use utreexo_stump::accumulator::stump::Stump;
    /// let s = Stump::new();
    /// // Creates a tree with those values as leaves
    /// let test_values: Vec<u8> = vec![0, 1, 2, 3, 4, 5, 6, 7];
    /// // Targets are nodes witch we intend to prove
    /// let targets = vec![0];
    ///
    /// let mut proof_hashes = Vec::new();
    /// // This tree will look like this
    /// // 14
    /// // |-----------------\
    /// // 12                13
    /// // |---------\       |--------\
    /// // 08       09       10       11
    /// // |----\   |----\   |----\   |----\
    /// // 00   01  02   03  04   05  06   07
    /// // For proving 0, we need 01, 09 and 13's hashes. 00, 08, 12 and 14 can be calculated
    /// proof_hashes.push(
    ///     BitcoinNodeHash::from_str(
    ///         "4bf5122f344554c53bde2ebb8cd2b7e3d1600ad631c385a5d7cce23c7785459a",
    ///     )
    ///     .unwrap(),
    /// );
    /// proof_hashes.push(
    ///     BitcoinNodeHash::from_str(
    ///         "9576f4ade6e9bc3a6458b506ce3e4e890df29cb14cb5d3d887672aef55647a2b",
    ///     )
    ///     .unwrap(),
    /// );
    /// proof_hashes.push(
    ///     BitcoinNodeHash::from_str(
    ///         "29590a14c1b09384b94a2c0e94bf821ca75b62eacebc47893397ca88e3bbcbd7",
    ///     )
    ///     .unwrap(),
    /// );
    ///
    /// let mut hashes: Vec<BitcoinNodeHash> = Vec::new();
    /// for i in test_values {
    ///     let mut engine = Sha256::engine();
    ///     engine.input(&[i]);
    ///     let hash = Sha256::from_engine(engine);
    ///     hashes.push(hash.into());
    /// }
    /// let s = s.modify(&hashes, &[], &Proof::default()).unwrap().0;
    /// let p = Proof::new(targets, proof_hashes);
    /// assert!(p
    ///     .verify(&[hashes[0]], s.get_roots(), s.num_leaves())
    ///     .expect("This proof is valid"));
    /// ```
    pub fn verify(
        &self,
        del_hashes: &[Hash],
        roots: &[Hash],
        num_leaves: u64,
    ) -> Result<bool, UtreexoError> {
        if del_hashes.len() != self.targets.len() {
            return Err(UtreexoError::InvalidArgument(format!(
                "got {} hashes for {} targets",
                del_hashes.len(),
                self.targets.len()
            )));
        }

        if self.targets.is_empty() {
            return Ok(true);
        }

        let (_, calculated_roots) = self.calculate_hashes(del_hashes, num_leaves)?;

        let forest_rows = util::tree_rows(num_leaves);
        for (pos, calculated_root) in calculated_roots {
            let idx = util::root_index(pos, num_leaves, forest_rows);
            if roots.get(idx) != Some(&calculated_root) {
                debug!(position = pos, root = idx, "proof doesn't match the accumulator");
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// This function computes a set of roots from a proof. Returns every node it went
    /// through (the targets included) sorted by position, and the computed roots with their
    /// positions.
    pub(crate) fn calculate_hashes(
        &self,
        del_hashes: &[Hash],
        num_leaves: u64,
    ) -> Result<NodesAndRoots<Hash>, UtreexoError> {
        self.check_targets(del_hashes, num_leaves, UtreexoError::InvalidProof)?;

        let nodes: Vec<_> = self
            .targets
            .iter()
            .copied()
            .zip(del_hashes.iter().copied())
            .collect();

        self.walk(
            nodes,
            num_leaves,
            UtreexoError::InvalidProof,
            |hash| hash,
            |left, right| Hash::parent_hash(&left, &right),
        )
    }

    /// Same as [Proof::calculate_hashes], but computes the forest both before and after the
    /// targets are deleted. Returns the post-deletion value of every node above a target
    /// and, for each root reached, its position and old and new values.
    ///
    /// Malformed targets (unsorted, duplicated, outside the forest or above one another) are
    /// an [UtreexoError::InvalidArgument] here.
    #[allow(clippy::type_complexity)]
    pub(crate) fn calculate_hashes_delete(
        &self,
        del_hashes: &[Hash],
        num_leaves: u64,
    ) -> Result<(Vec<(u64, Hash)>, Vec<(u64, Hash, Hash)>), UtreexoError> {
        self.check_targets(del_hashes, num_leaves, UtreexoError::InvalidArgument)?;

        let nodes: Vec<_> = self
            .targets
            .iter()
            .zip(del_hashes.iter())
            .map(|(pos, hash)| (*pos, (*hash, Hash::empty())))
            .collect();

        let (nodes, roots) = self.walk(
            nodes,
            num_leaves,
            UtreexoError::InvalidArgument,
            |hash| (hash, hash),
            |(left_old, left_new), (right_old, right_new)| {
                let old = Hash::parent_hash(&left_old, &right_old);
                // A deleted child takes nothing along, the other one moves up
                let new = match (left_new.is_empty(), right_new.is_empty()) {
                    (true, true) => Hash::empty(),
                    (true, false) => right_new,
                    (false, true) => left_new,
                    (false, false) => Hash::parent_hash(&left_new, &right_new),
                };
                (old, new)
            },
        )?;

        let new_del = nodes
            .into_iter()
            .filter(|(pos, _)| self.targets.binary_search(pos).is_err())
            .map(|(pos, (_, new))| (pos, new))
            .collect();
        let roots = roots
            .into_iter()
            .map(|(pos, (old, new))| (pos, old, new))
            .collect();

        Ok((new_del, roots))
    }

    /// Walks the targets up to their roots. `nodes` are the targets with whatever each
    /// node carries, `from_proof` lifts a proof hash into that and `combine` builds a parent
    /// from its left and right children. `bad_targets` builds the error for targets that are
    /// ancestors of one another.
    fn walk<T: Copy>(
        &self,
        mut nodes: Vec<(u64, T)>,
        num_leaves: u64,
        bad_targets: fn(String) -> UtreexoError,
        from_proof: impl Fn(Hash) -> T,
        combine: impl Fn(T, T) -> T,
    ) -> Result<NodesAndRoots<T>, UtreexoError> {
        let forest_rows = util::tree_rows(num_leaves);
        let mut hashes_iter = self.hashes.iter();
        let mut roots = Vec::new();

        let mut i = 0;
        while i < nodes.len() {
            let (pos, value) = nodes[i];
            i += 1;

            // If the current position is a root, we add that to our result and don't go any further
            if util::is_root_position(pos, num_leaves, forest_rows) {
                roots.push((pos, value));
                continue;
            }

            // Is the next node our sibling? If so, we should be hashed together. If not,
            // the sibling must be passed inside the proof
            let sibling = match nodes.get(i) {
                Some((next_pos, next_value)) if util::is_right_sibling(pos, *next_pos) => {
                    i += 1;
                    *next_value
                }
                _ => {
                    let hash = hashes_iter.next().ok_or_else(|| {
                        UtreexoError::InvalidProof(format!(
                            "proof too short, missing the sibling of {pos}"
                        ))
                    })?;
                    from_proof(*hash)
                }
            };

            let parent_value = if util::is_left_niece(pos) {
                combine(value, sibling)
            } else {
                combine(sibling, value)
            };

            let parent = util::parent(pos, forest_rows);
            match nodes.binary_search_by_key(&parent, |(node_pos, _)| *node_pos) {
                Ok(_) => {
                    return Err(bad_targets(format!(
                        "target {parent} is an ancestor of another target"
                    )))
                }
                Err(idx) => nodes.insert(idx, (parent, parent_value)),
            }
        }

        if hashes_iter.next().is_some() {
            return Err(UtreexoError::InvalidProof(format!(
                "proof has {} unused hashes",
                hashes_iter.len() + 1
            )));
        }

        Ok((nodes, roots))
    }

    /// Checks the targets can be walked at all. Unsorted, duplicated and missing targets are
    /// reported through `bad_targets`.
    fn check_targets(
        &self,
        del_hashes: &[Hash],
        num_leaves: u64,
        bad_targets: fn(String) -> UtreexoError,
    ) -> Result<(), UtreexoError> {
        util::check_num_leaves(num_leaves)?;
        if del_hashes.len() != self.targets.len() {
            return Err(UtreexoError::InvalidArgument(format!(
                "got {} hashes for {} targets",
                del_hashes.len(),
                self.targets.len()
            )));
        }
        if del_hashes
            .iter()
            .any(|hash| hash.is_empty() || hash.is_placeholder())
        {
            return Err(UtreexoError::InvalidArgument(
                "can't prove an empty or placeholder hash".into(),
            ));
        }
        if let Some(pair) = self.targets.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(bad_targets(format!(
                "targets must be strictly ascending, found {} before {}",
                pair[0], pair[1]
            )));
        }

        let forest_rows = util::tree_rows(num_leaves);
        if let Some(target) = self
            .targets
            .iter()
            .find(|target| !util::in_forest(**target, num_leaves, forest_rows))
        {
            return Err(bad_targets(format!(
                "target {target} doesn't exist in a forest with {num_leaves} leaves"
            )));
        }

        Ok(())
    }

    /// Every node this proof lets us know: the targets, their ancestors and the proof
    /// hashes, by position.
    fn known_nodes(
        &self,
        del_hashes: &[Hash],
        num_leaves: u64,
    ) -> Result<HashMap<u64, Hash>, UtreexoError> {
        util::check_num_leaves(num_leaves)?;
        if self.targets.is_empty() {
            if !del_hashes.is_empty() || !self.hashes.is_empty() {
                return Err(UtreexoError::InvalidArgument(
                    "a proof without targets can't have hashes".into(),
                ));
            }
            return Ok(HashMap::new());
        }

        let (nodes, _) = self.calculate_hashes(del_hashes, num_leaves)?;
        let proof_positions =
            util::get_proof_positions(&self.targets, num_leaves, util::tree_rows(num_leaves));

        Ok(nodes
            .into_iter()
            .chain(proof_positions.into_iter().zip(self.hashes.iter().copied()))
            .collect())
    }

    /// Collects the canonical proof hashes for `targets` out of `known`.
    fn hashes_for(
        known: &HashMap<u64, Hash>,
        targets: &[u64],
        num_leaves: u64,
    ) -> Result<Vec<Hash>, UtreexoError> {
        util::get_proof_positions(targets, num_leaves, util::tree_rows(num_leaves))
            .into_iter()
            .map(|pos| {
                known.get(&pos).copied().ok_or_else(|| {
                    error!(position = pos, num_leaves, "missing a hash for the new proof");
                    UtreexoError::Accumulator(format!("no hash known for position {pos}"))
                })
            })
            .collect()
    }

    /// Updates this proof so it follows the accumulator through one [Stump::modify] call.
    ///
    /// `cached_hashes` are the hashes of this proof's targets, `add_hashes` and
    /// `block_targets` are the leaves added and the positions deleted by that call, and
    /// `update_data` is what it returned. `remembers` are indexes into `add_hashes` of new
    /// leaves that should be proven from now on. Targets that got deleted are dropped.
    ///
    /// Returns the new proof and the hashes of its targets, in target order.
    ///
    /// [Stump::modify]: super::stump::Stump::modify
    /// # Example
    /// ```
    /// use utreexo_stump::accumulator::node_hash::BitcoinNodeHash;
    /// use utreexo_stump::accumulator::proof::Proof;
    /// use utreexo_stump::accumulator::stump::Stump;
    ///
    /// let utxos: Vec<_> = (0..4_u8).map(|i| BitcoinNodeHash::new([i; 32])).collect();
    /// let (s, update_data) = Stump::new()
    ///     .modify(&utxos, &[], &Proof::default())
    ///     .unwrap();
    ///
    /// // Start tracking the leaves at 1 and 3
    /// let (p, cached_hashes) = Proof::default()
    ///     .update(vec![], utxos.clone(), vec![], vec![1, 3], update_data)
    ///     .unwrap();
    /// assert_eq!(p.targets(), &[1, 3]);
    /// assert_eq!(s.verify(&p, &cached_hashes), Ok(true));
    /// ```
    pub fn update(
        &self,
        cached_hashes: Vec<Hash>,
        add_hashes: Vec<Hash>,
        block_targets: Vec<u64>,
        remembers: Vec<u64>,
        update_data: UpdateData<Hash>,
    ) -> Result<(Proof<Hash>, Vec<Hash>), UtreexoError> {
        let num_leaves = update_data.prev_num_leaves;
        let forest_rows = util::tree_rows(num_leaves);

        if cached_hashes.len() != self.targets.len() {
            return Err(UtreexoError::InvalidArgument(format!(
                "got {} cached hashes for {} targets",
                cached_hashes.len(),
                self.targets.len()
            )));
        }
        if let Some(idx) = remembers.iter().find(|idx| **idx >= add_hashes.len() as u64) {
            return Err(UtreexoError::InvalidArgument(format!(
                "can't remember addition {idx}, there are only {}",
                add_hashes.len()
            )));
        }
        let new_num_leaves = num_leaves
            .checked_add(add_hashes.len() as u64)
            .ok_or_else(|| UtreexoError::InvalidArgument("leaf count overflows".into()))?;
        util::check_num_leaves(new_num_leaves)?;

        debug!(
            num_leaves,
            targets = self.targets.len(),
            additions = add_hashes.len(),
            deletions = block_targets.len(),
            remembers = remembers.len(),
            "updating proof"
        );

        let mut known = self.known_nodes(&cached_hashes, num_leaves)?;
        let mut tracked: Vec<(u64, Hash)> = self
            .targets
            .iter()
            .copied()
            .zip(cached_hashes)
            .collect();

        // Deletions. Everything on a path from a deleted node to its root is stale, and
        // everything under a deleted node went away with it.
        let mut block_targets = block_targets;
        block_targets.sort_unstable();
        block_targets.dedup();
        let dels = util::detwin(block_targets, forest_rows);

        known.retain(|pos, _| {
            !dels.iter().any(|del| {
                *pos == *del
                    || util::is_ancestor(*pos, *del, forest_rows)
                    || util::is_ancestor(*del, *pos, forest_rows)
            })
        });
        tracked.retain(|(pos, _)| {
            !dels
                .iter()
                .any(|del| *pos == *del || util::is_ancestor(*del, *pos, forest_rows))
        });

        for (pos, hash) in update_data.new_del {
            if hash.is_empty() {
                known.remove(&pos);
            } else {
                known.insert(pos, hash);
            }
        }

        // A deleted root has no sibling to move up
        for del in dels
            .iter()
            .filter(|del| !util::is_root_position(**del, num_leaves, forest_rows))
        {
            Self::move_up(&mut known, &mut tracked, *del, forest_rows)?;
        }

        // Additions
        let new_forest_rows = util::tree_rows(new_num_leaves);
        known = known
            .into_iter()
            .map(|(pos, hash)| (util::translate(pos, forest_rows, new_forest_rows), hash))
            .collect();
        for (pos, _) in tracked.iter_mut() {
            *pos = util::translate(*pos, forest_rows, new_forest_rows);
        }

        let mut remembers = remembers;
        remembers.sort_unstable();
        remembers.dedup();
        for idx in remembers {
            tracked.push((num_leaves + idx, add_hashes[idx as usize]));
        }

        for del in update_data.to_destroy {
            Self::move_up(&mut known, &mut tracked, del, new_forest_rows)?;
        }
        known.extend(update_data.new_add);

        tracked.sort_unstable_by_key(|(pos, _)| *pos);
        let (targets, cached_hashes): (Vec<u64>, Vec<Hash>) = tracked.into_iter().unzip();
        let hashes = Self::hashes_for(&known, &targets, new_num_leaves)?;

        Ok((Proof { targets, hashes }, cached_hashes))
    }

    /// Moves the subtree under the sibling of `del` one row up, into their parent.
    fn move_up(
        known: &mut HashMap<u64, Hash>,
        tracked: &mut [(u64, Hash)],
        del: u64,
        forest_rows: u8,
    ) -> Result<(), UtreexoError> {
        let sibling = util::sibling(del);
        let next_pos = |pos: u64| {
            if pos == sibling || util::is_ancestor(sibling, pos, forest_rows) {
                util::calc_next_pos(pos, del, forest_rows)
            } else {
                Ok(pos)
            }
        };

        *known = known
            .drain()
            .map(|(pos, hash)| next_pos(pos).map(|pos| (pos, hash)))
            .collect::<Result<_, UtreexoError>>()?;
        for (pos, _) in tracked.iter_mut() {
            *pos = next_pos(*pos)?;
        }

        Ok(())
    }

    /// Returns a new proof for a subset of this proof's targets, which may come in any
    /// order. `del_hashes` are the hashes for this proof's targets.
    /// # Example
    /// ```
    /// use utreexo_stump::accumulator::node_hash::BitcoinNodeHash;
    /// use utreexo_stump::accumulator::proof::Proof;
    /// use utreexo_stump::accumulator::stump::Stump;
    ///
    /// let utxos: Vec<_> = (0..4_u8).map(|i| BitcoinNodeHash::new([i; 32])).collect();
    /// let (s, update_data) = Stump::new()
    ///     .modify(&utxos, &[], &Proof::default())
    ///     .unwrap();
    /// let (p, cached_hashes) = Proof::default()
    ///     .update(vec![], utxos.clone(), vec![], vec![0, 1, 2, 3], update_data)
    ///     .unwrap();
    ///
    /// let subset = p
    ///     .get_proof_subset(&cached_hashes, &[2], s.num_leaves())
    ///     .unwrap();
    /// assert_eq!(subset.hashes().len(), 2);
    /// assert_eq!(s.verify(&subset, &[utxos[2]]), Ok(true));
    /// ```
    pub fn get_proof_subset(
        &self,
        del_hashes: &[Hash],
        targets: &[u64],
        num_leaves: u64,
    ) -> Result<Proof<Hash>, UtreexoError> {
        let known = self.known_nodes(del_hashes, num_leaves)?;

        let mut targets = targets.to_vec();
        targets.sort_unstable();
        targets.dedup();
        if let Some(target) = targets
            .iter()
            .find(|target| self.targets.binary_search(*target).is_err())
        {
            return Err(UtreexoError::InvalidArgument(format!(
                "{target} isn't a target of this proof"
            )));
        }

        let hashes = Self::hashes_for(&known, &targets, num_leaves)?;
        Ok(Proof { targets, hashes })
    }

    /// Writes this proof out. Returns how many bytes were written.
    ///
    /// The format is the target count as a little-endian u64, each target as a
    /// little-endian u64, the hash count as a little-endian u64, then each hash.
    /// # Example
    /// ```
    /// use utreexo_stump::accumulator::node_hash::BitcoinNodeHash;
    /// use utreexo_stump::accumulator::proof::Proof;
    ///
    /// let proof = Proof::new(vec![0], vec![BitcoinNodeHash::new([1; 32])]);
    /// let mut buf = Vec::new();
    /// assert_eq!(proof.serialize(&mut buf).unwrap(), 56);
    /// assert_eq!(Proof::deserialize(buf.as_slice()).unwrap(), proof);
    /// ```
    pub fn serialize<W: Write>(&self, mut writer: W) -> Result<usize, UtreexoError> {
        let mut buf = Vec::new();

        buf.extend_from_slice(&(self.targets.len() as u64).to_le_bytes());
        for target in self.targets.iter() {
            buf.extend_from_slice(&target.to_le_bytes());
        }

        buf.extend_from_slice(&(self.hashes.len() as u64).to_le_bytes());
        for hash in self.hashes.iter() {
            hash.write(&mut buf)?;
        }

        writer.write_all(&buf)?;
        Ok(buf.len())
    }

    /// Reads a proof written by [Proof::serialize].
    pub fn deserialize<R: Read>(mut reader: R) -> Result<Self, UtreexoError> {
        // Counts come off the wire, so nothing is allocated up front
        let n_targets = read_u64(&mut reader)?;
        let mut targets = Vec::new();
        for _ in 0..n_targets {
            targets.push(read_u64(&mut reader)?);
        }

        let n_hashes = read_u64(&mut reader)?;
        let mut hashes = Vec::new();
        for _ in 0..n_hashes {
            hashes.push(Hash::read(&mut reader)?);
        }

        Ok(Proof { targets, hashes })
    }
}

fn read_u64<R: Read>(reader: &mut R) -> Result<u64, UtreexoError> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bitcoin_hashes::sha256;
    use bitcoin_hashes::Hash;
    use bitcoin_hashes::HashEngine;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::Rng;
    use rand::SeedableRng;
    use serde::Deserialize;

    use super::Proof;
    use crate::accumulator::error::UtreexoError;
    use crate::accumulator::node_hash::AccumulatorHash;
    use crate::accumulator::node_hash::BitcoinNodeHash;
    use crate::accumulator::stump::Stump;
    use crate::accumulator::util::hash_from_u8;

    #[derive(Deserialize)]
    struct TestCase {
        numleaves: usize,
        roots: Vec<String>,
        targets: Vec<u64>,
        target_preimages: Vec<u8>,
        proofhashes: Vec<String>,
        expected: bool,
    }

    #[derive(Deserialize)]
    struct TestsJSON {
        proof_tests: Vec<TestCase>,
    }

    fn parse_hashes(hashes: &[&str]) -> Vec<BitcoinNodeHash> {
        hashes
            .iter()
            .map(|hash| BitcoinNodeHash::from_str(hash).expect("Test case hash is valid"))
            .collect()
    }

    fn leaf_hashes(count: u8) -> Vec<BitcoinNodeHash> {
        (0..count).map(hash_from_u8).collect()
    }

    // The 12 leaf forest and the proof for 0, 4, 5, 6, 7 and 8 in it
    fn twelve_leaves() -> (Stump, Vec<BitcoinNodeHash>, Proof) {
        let hashes = leaf_hashes(12);
        let (s, _) = Stump::new()
            .modify(&hashes, &[], &Proof::default())
            .unwrap();

        let proof_hashes = parse_hashes(&[
            "4bf5122f344554c53bde2ebb8cd2b7e3d1600ad631c385a5d7cce23c7785459a",
            "2b4c342f5433ebe591a1da77e013d1b72475562d48578dca8b84bac6651c3cb9",
            "9576f4ade6e9bc3a6458b506ce3e4e890df29cb14cb5d3d887672aef55647a2b",
            "c413035120e8c9b0ca3e40c93d06fe60a0d056866138300bb1f1dd172b4923c3",
        ]);

        (s, hashes, Proof::new(vec![0, 4, 5, 6, 7, 8], proof_hashes))
    }

    fn run_single_case(case: TestCase) {
        let roots = case
            .roots
            .iter()
            .map(|root| BitcoinNodeHash::from_str(root).expect("Test case hash is valid"))
            .collect();
        let s = Stump::from_roots(roots, case.numleaves as u64).expect("Test case is valid");

        let del_hashes: Vec<_> = case
            .target_preimages
            .into_iter()
            .map(hash_from_u8)
            .collect();

        let proof_hashes = case
            .proofhashes
            .iter()
            .map(|hash| BitcoinNodeHash::from_str(hash).expect("Test case hash is valid"))
            .collect();

        let p = Proof::new(case.targets, proof_hashes);
        assert_eq!(s.verify(&p, &del_hashes), Ok(case.expected));
    }

    #[test]
    fn test_proof_verify() {
        let contents = std::fs::read_to_string("test_values/test_cases.json")
            .expect("Something went wrong reading the file");

        let values = serde_json::from_str::<TestsJSON>(contents.as_str())
            .expect("JSON deserialization error");

        for case in values.proof_tests {
            run_single_case(case);
        }
    }

    #[test]
    fn test_calculate_hashes() {
        // Tests if the calculated roots and nodes are correct.
        let hashes = leaf_hashes(8);
        // Create a new stump with 8 leaves and 1 root
        let s = Stump::new()
            .modify(&hashes, &[], &Proof::default())
            .expect("This stump is valid")
            .0;

        // Nodes that will be deleted
        let del_hashes = vec![hashes[0], hashes[2], hashes[4], hashes[6]];
        let proof_hashes = parse_hashes(&[
            "4bf5122f344554c53bde2ebb8cd2b7e3d1600ad631c385a5d7cce23c7785459a",
            "084fed08b978af4d7d196a7446a86b58009e636b611db16211b65a9aadff29c5",
            "e77b9a9ae9e30b0dbdb6f510a264ef9de781501d7b6b92ae89eb059c5ab743db",
            "ca358758f6d27e6cf45272937977a748fd88391db679ceda7dc7bf1f005ee879",
        ]);

        let p = Proof::new(vec![0, 2, 4, 6], proof_hashes);

        // We should get those computed nodes...
        let expected_hashes = parse_hashes(&[
            "6e340b9cffb37a989ca544e6bb780a2c78901d3fb33738768511a30617afa01d",
            "dbc1b4c900ffe48d575b5da5c638040125f65db0fe3e24494b76ea986457d986",
            "e52d9c508c502347344d8c07ad91cbd6068afc75ff6292f062a09ca381c89e71",
            "67586e98fad27da0b9968bc039a1ef34c939b9b8e523a8bef89d478608c5ecf6",
            "02242b37d8e851f1e86f46790298c7097df06893d6226b7c1453c213e91717de",
            "9576f4ade6e9bc3a6458b506ce3e4e890df29cb14cb5d3d887672aef55647a2b",
            "9eec588c41d87b16b0ee226cb38da3864f9537632321d8be855a73d5616dcc73",
            "34028bbc87000c39476cdc60cf80ca32d579b3a0e2d3f80e0ad8c3739a01aa91",
            "df46b17be5f66f0750a4b3efa26d4679db170a72d41eb56c3e4ff75a58c65386",
            "29590a14c1b09384b94a2c0e94bf821ca75b62eacebc47893397ca88e3bbcbd7",
            "b151a956139bb821d4effa34ea95c17560e0135d1e4661fc23cedc3af49dac42",
        ]);
        // ... at these positions ...
        let expected_pos = [0_u64, 2, 4, 6, 8, 9, 10, 11, 12, 13, 14];

        let (nodes, roots) = p
            .calculate_hashes(&del_hashes, s.num_leaves())
            .expect("We don't expect any errors from this simple test");

        // ... leading to this root
        assert_eq!(roots, vec![(14_u64, s.get_roots()[0])]);

        let expected: Vec<_> = expected_pos.iter().copied().zip(expected_hashes).collect();
        assert_eq!(nodes, expected);
    }

    #[test]
    fn test_calculate_hashes_delete() {
        let hashes = leaf_hashes(4);
        let p = Proof::new(vec![0, 2], vec![hashes[1], hashes[3]]);

        let (new_del, roots) = p
            .calculate_hashes_delete(&[hashes[0], hashes[2]], 4)
            .unwrap();

        // 0 and 2 go away, 1 and 3 move up into 4 and 5
        let new_root = BitcoinNodeHash::parent_hash(&hashes[1], &hashes[3]);
        assert_eq!(new_del, vec![(4, hashes[1]), (5, hashes[3]), (6, new_root)]);

        let old_root = BitcoinNodeHash::parent_hash(
            &BitcoinNodeHash::parent_hash(&hashes[0], &hashes[1]),
            &BitcoinNodeHash::parent_hash(&hashes[2], &hashes[3]),
        );
        assert_eq!(roots, vec![(6, old_root, new_root)]);

        // Deleting a whole tree leaves nothing behind
        let p = Proof::new(vec![0, 1, 2, 3], vec![]);
        let (new_del, roots) = p.calculate_hashes_delete(&hashes, 4).unwrap();
        assert!(new_del.iter().all(|(_, hash)| hash.is_empty()));
        assert!(roots[0].2.is_empty());
    }

    #[test]
    fn test_verify_errors() {
        let (s, hashes, proof) = twelve_leaves();
        let del_hashes: Vec<_> = proof
            .targets()
            .iter()
            .map(|target| hashes[*target as usize])
            .collect();
        assert_eq!(s.verify(&proof, &del_hashes), Ok(true));

        // An empty proof always verifies
        assert_eq!(s.verify(&Proof::default(), &[]), Ok(true));

        // Hash count doesn't match the targets
        assert!(matches!(
            s.verify(&proof, &del_hashes[1..]),
            Err(UtreexoError::InvalidArgument(_))
        ));

        // Too short
        let short = Proof::new(proof.targets().to_vec(), proof.hashes()[1..].to_vec());
        assert!(matches!(
            s.verify(&short, &del_hashes),
            Err(UtreexoError::InvalidProof(_))
        ));

        // Too long
        let mut long_hashes = proof.hashes().to_vec();
        long_hashes.push(hashes[0]);
        let long = Proof::new(proof.targets().to_vec(), long_hashes);
        assert!(matches!(
            s.verify(&long, &del_hashes),
            Err(UtreexoError::InvalidProof(_))
        ));

        // Unsorted
        let unsorted = Proof::new(vec![4, 0, 5, 6, 7, 8], proof.hashes().to_vec());
        assert!(matches!(
            s.verify(&unsorted, &del_hashes),
            Err(UtreexoError::InvalidProof(_))
        ));

        // 16 is the parent of 0 and 1, and can't be proven along with 0
        let parent_of_0 = BitcoinNodeHash::parent_hash(&hashes[0], &hashes[1]);
        let ancestor = Proof::new(vec![0, 16], vec![hashes[1]]);
        assert!(matches!(
            s.verify(&ancestor, &[hashes[0], parent_of_0]),
            Err(UtreexoError::InvalidProof(_))
        ));

        // A position past the last leaf
        let missing = Proof::new(vec![12], vec![]);
        assert!(matches!(
            s.verify(&missing, &[hashes[0]]),
            Err(UtreexoError::InvalidProof(_))
        ));

        assert!(matches!(
            Proof::<BitcoinNodeHash>::try_new(vec![1, 1], vec![]),
            Err(UtreexoError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_tamper() {
        let contents = std::fs::read_to_string("test_values/test_cases.json")
            .expect("Something went wrong reading the file");
        let values = serde_json::from_str::<TestsJSON>(contents.as_str())
            .expect("JSON deserialization error");

        for case in values.proof_tests.into_iter().filter(|case| case.expected) {
            let roots: Vec<_> = case
                .roots
                .iter()
                .map(|root| BitcoinNodeHash::from_str(root).unwrap())
                .collect();
            let num_leaves = case.numleaves as u64;
            let del_hashes: Vec<_> = case
                .target_preimages
                .iter()
                .copied()
                .map(hash_from_u8)
                .collect();
            let proof_hashes: Vec<_> = case
                .proofhashes
                .iter()
                .map(|hash| BitcoinNodeHash::from_str(hash).unwrap())
                .collect();

            let proof = Proof::new(case.targets.clone(), proof_hashes.clone());
            assert_eq!(proof.verify(&del_hashes, &roots, num_leaves), Ok(true));

            for i in 0..proof_hashes.len() {
                for bit in 0..256 {
                    let mut tampered = proof_hashes.clone();
                    let mut bytes = *tampered[i];
                    bytes[bit / 8] ^= 1 << (bit % 8);
                    tampered[i] = BitcoinNodeHash::new(bytes);

                    let proof = Proof::new(case.targets.clone(), tampered);
                    assert_ne!(proof.verify(&del_hashes, &roots, num_leaves), Ok(true));
                }
            }

            for i in 0..case.targets.len() {
                for bit in 0..64 {
                    let mut tampered = case.targets.clone();
                    tampered[i] ^= 1 << bit;

                    let proof = Proof::new(tampered, proof_hashes.clone());
                    assert_ne!(proof.verify(&del_hashes, &roots, num_leaves), Ok(true));
                }
            }
        }
    }

    #[test]
    fn test_update_remember_all() {
        let hashes = leaf_hashes(12);
        let (s, update_data) = Stump::new()
            .modify(&hashes, &[], &Proof::default())
            .unwrap();

        let (p, cached_hashes) = Proof::default()
            .update(vec![], hashes.clone(), vec![], (0..12).collect(), update_data)
            .unwrap();
        assert_eq!(p.targets(), &(0..12).collect::<Vec<_>>()[..]);
        assert_eq!(cached_hashes, hashes);
        assert!(p.hashes().is_empty());
        assert_eq!(s.verify(&p, &cached_hashes), Ok(true));

        // Spend 0, 4, 5, 6, 7 and 8
        let del_targets = vec![0, 4, 5, 6, 7, 8];
        let del_hashes: Vec<_> = del_targets.iter().map(|t| hashes[*t as usize]).collect();
        let del_proof = p
            .get_proof_subset(&cached_hashes, &del_targets, s.num_leaves())
            .unwrap();
        assert_eq!(del_proof, twelve_leaves().2);

        let (s, update_data) = s.modify(&[], &del_hashes, &del_proof).unwrap();
        let (p, cached_hashes) = p
            .update(cached_hashes, vec![], del_targets, vec![], update_data)
            .unwrap();

        assert_eq!(p.targets(), &[10, 11, 18, 19, 20, 24]);
        assert_eq!(
            cached_hashes,
            vec![
                hashes[10], hashes[11], hashes[2], hashes[3], hashes[9], hashes[1]
            ]
        );
        assert!(p.hashes().is_empty());
        assert_eq!(s.verify(&p, &cached_hashes), Ok(true));
    }

    #[test]
    fn test_update_bad_input() {
        let hashes = leaf_hashes(4);
        let (_, update_data) = Stump::new()
            .modify(&hashes, &[], &Proof::default())
            .unwrap();

        assert!(matches!(
            Proof::default().update(vec![], hashes.clone(), vec![], vec![4], update_data.clone()),
            Err(UtreexoError::InvalidArgument(_))
        ));
        assert!(matches!(
            Proof::default().update(vec![hashes[0]], hashes, vec![], vec![], update_data),
            Err(UtreexoError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_get_proof_subset() {
        let (s, hashes, proof) = twelve_leaves();
        let del_hashes: Vec<_> = proof
            .targets()
            .iter()
            .map(|target| hashes[*target as usize])
            .collect();

        // Out of order targets are fine
        let subset = proof
            .get_proof_subset(&del_hashes, &[8, 0], s.num_leaves())
            .unwrap();
        assert_eq!(subset.targets(), &[0, 8]);
        assert_eq!(s.verify(&subset, &[hashes[0], hashes[8]]), Ok(true));

        let empty = proof.get_proof_subset(&del_hashes, &[], s.num_leaves()).unwrap();
        assert_eq!(empty, Proof::default());

        assert!(matches!(
            proof.get_proof_subset(&del_hashes, &[1], s.num_leaves()),
            Err(UtreexoError::InvalidArgument(_))
        ));
    }

    fn random_hash(rng: &mut StdRng) -> BitcoinNodeHash {
        let mut engine = sha256::Hash::engine();
        engine.input(&rng.gen::<[u8; 32]>());
        sha256::Hash::from_engine(engine).into()
    }

    #[test]
    fn test_update_random() {
        // A bridge remembers every leaf and serves deletion proofs, a wallet only remembers
        // some of the new leaves. Both must keep valid proofs block after block.
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut stump = Stump::new();
            let mut bridge = (Proof::default(), Vec::new());
            let mut wallet = (Proof::default(), Vec::new());

            for _ in 0..40 {
                let n_dels = rng.gen_range(0..=bridge.0.n_targets().min(6));
                let mut del_targets: Vec<u64> = bridge
                    .0
                    .targets()
                    .choose_multiple(&mut rng, n_dels)
                    .copied()
                    .collect();
                del_targets.sort_unstable();

                let del_hashes: Vec<_> = del_targets
                    .iter()
                    .map(|target| {
                        let idx = bridge.0.targets().binary_search(target).unwrap();
                        bridge.1[idx]
                    })
                    .collect();
                let del_proof = bridge
                    .0
                    .get_proof_subset(&bridge.1, &del_targets, stump.num_leaves())
                    .unwrap();
                assert_eq!(stump.verify(&del_proof, &del_hashes), Ok(true));

                let additions: Vec<_> = (0..rng.gen_range(0..=8))
                    .map(|_| random_hash(&mut rng))
                    .collect();
                let mut remembers: Vec<u64> = (0..additions.len() as u64)
                    .filter(|_| rng.gen_bool(0.5))
                    .collect();
                remembers.shuffle(&mut rng);

                let (new_stump, update_data) =
                    stump.modify(&additions, &del_hashes, &del_proof).unwrap();
                assert_eq!(
                    new_stump.num_leaves(),
                    stump.num_leaves() + additions.len() as u64
                );
                assert_eq!(
                    new_stump.get_roots().len(),
                    new_stump.num_leaves().count_ones() as usize
                );

                bridge = bridge
                    .0
                    .update(
                        bridge.1,
                        additions.clone(),
                        del_targets.clone(),
                        (0..additions.len() as u64).collect(),
                        update_data.clone(),
                    )
                    .unwrap();
                wallet = wallet
                    .0
                    .update(wallet.1, additions, del_targets, remembers, update_data)
                    .unwrap();
                stump = new_stump;

                assert_eq!(stump.verify(&bridge.0, &bridge.1), Ok(true));
                assert_eq!(stump.verify(&wallet.0, &wallet.1), Ok(true));

                if wallet.0.n_targets() > 0 {
                    let n = rng.gen_range(1..=wallet.0.n_targets());
                    let subset_targets: Vec<u64> = wallet
                        .0
                        .targets()
                        .choose_multiple(&mut rng, n)
                        .copied()
                        .collect();
                    let subset = wallet
                        .0
                        .get_proof_subset(&wallet.1, &subset_targets, stump.num_leaves())
                        .unwrap();
                    let subset_hashes: Vec<_> = subset
                        .targets()
                        .iter()
                        .map(|target| {
                            let idx = wallet.0.targets().binary_search(target).unwrap();
                            wallet.1[idx]
                        })
                        .collect();
                    assert_eq!(stump.verify(&subset, &subset_hashes), Ok(true));
                }
            }
        }
    }

    #[test]
    fn test_serialize_rtt() {
        let (_, _, proof) = twelve_leaves();

        let mut buf = Vec::new();
        let written = proof.serialize(&mut buf).unwrap();
        assert_eq!(written, 8 + 6 * 8 + 8 + 4 * 32);
        assert_eq!(written, buf.len());
        assert_eq!(&buf[..8], &6_u64.to_le_bytes());

        let deserialized = Proof::<BitcoinNodeHash>::deserialize(buf.as_slice()).unwrap();
        assert_eq!(deserialized, proof);

        let mut buf = Vec::new();
        assert_eq!(Proof::<BitcoinNodeHash>::default().serialize(&mut buf).unwrap(), 16);
        assert_eq!(
            Proof::<BitcoinNodeHash>::deserialize(buf.as_slice()).unwrap(),
            Proof::default()
        );
    }

    #[test]
    fn test_deserialize_malformed() {
        let (_, _, proof) = twelve_leaves();
        let mut buf = Vec::new();
        proof.serialize(&mut buf).unwrap();

        for len in [0, 7, 20, buf.len() - 1] {
            assert!(matches!(
                Proof::<BitcoinNodeHash>::deserialize(&buf[..len]),
                Err(UtreexoError::Serialization(_))
            ));
        }

        // A huge count with nothing behind it
        let mut huge = u64::MAX.to_le_bytes().to_vec();
        huge.extend_from_slice(&[0; 8]);
        assert!(matches!(
            Proof::<BitcoinNodeHash>::deserialize(huge.as_slice()),
            Err(UtreexoError::Serialization(_))
        ));

        // Sentinels can't be written
        let bad = Proof::new(vec![0], vec![BitcoinNodeHash::empty()]);
        assert!(matches!(
            bad.serialize(Vec::new()),
            Err(UtreexoError::Serialization(_))
        ));
    }

    #[cfg(feature = "with-serde")]
    #[test]
    fn test_serde_rtt() {
        let (_, _, proof) = twelve_leaves();
        let serialized = serde_json::to_string(&proof).expect("Serialization failed");
        let deserialized: Proof =
            serde_json::from_str(&serialized).expect("Deserialization failed");
        assert_eq!(proof, deserialized);
    }
}
