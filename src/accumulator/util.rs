//! Forest geometry. Every function here is pure arithmetic over positions, and the shape of
//! the forest is always recomputed from the number of leaves, never stored.
//!
//! Positions are packed per `forest_rows`, the number of rows the tallest possible tree has
//! for the current leaf count. With 8 leaves (`forest_rows = 3`) they look like this:
//! ```!
//! // 14
//! // |---------------\
//! // 12              13
//! // |-------\       |-------\
//! // 08      09      10      11
//! // |---\   |---\   |---\   |---\
//! // 00  01  02  03  04  05  06  07
//! ```
use super::error::UtreexoError;
use super::node_hash::AccumulatorHash;

/// The largest leaf count positions can be computed for. One more row and the top row's
/// positions no longer fit in a u64.
pub const MAX_LEAVES: u64 = 1 << 62;

pub fn check_num_leaves(num_leaves: u64) -> Result<(), UtreexoError> {
    if num_leaves > MAX_LEAVES {
        return Err(UtreexoError::InvalidArgument(format!(
            "{num_leaves} leaves is more than the {MAX_LEAVES} a forest can hold"
        )));
    }

    Ok(())
}

// is_root_position checks if the current position is a root given the number of
// leaves and the entire rows of the forest.
pub fn is_root_position(position: u64, num_leaves: u64, forest_rows: u8) -> bool {
    let row = detect_row(position, forest_rows);

    let root_present = num_leaves & (1 << row) != 0;
    let root_pos = root_position(num_leaves, row, forest_rows);

    root_present && root_pos == position
}

/// Index, inside the tallest-first root list, of the root sitting at `position`.
pub fn root_index(position: u64, num_leaves: u64, forest_rows: u8) -> usize {
    let row = detect_row(position, forest_rows);
    (num_leaves >> (row + 1)).count_ones() as usize
}

// removeBit removes the nth bit from the val passed in. For example, if the 2nd
// bit is to be removed from 1011 (11 in dec), the returned value is 111 (7 in dec).
pub fn remove_bit(val: u64, bit: u64) -> u64 {
    let mask = (2 << bit) - 1;
    let upper_mask = u64::MAX ^ mask;
    let upper = val & upper_mask;

    let mask = (1 << bit) - 1;
    let lower = val & mask;

    (upper >> 1) | lower
}

/// Returns the position `position` ends up at when `del_pos` is deleted and the subtree of
/// its sibling, which contains `position`, gets promoted one row.
pub fn calc_next_pos(position: u64, del_pos: u64, forest_rows: u8) -> Result<u64, UtreexoError> {
    let del_row = detect_row(del_pos, forest_rows);
    let pos_row = detect_row(position, forest_rows);

    if del_row < pos_row {
        return Err(UtreexoError::Accumulator(format!(
            "calc_next_pos fail: del_pos of {del_pos} is at a lower row than position at {position}"
        )));
    }

    // This is the lower bits where we'll remove the nth bit.
    let lower_bits = remove_bit(position, (del_row - pos_row) as u64);

    // This is the bit to be prepended.
    let to_row = pos_row + 1;
    let higher_bits = (1 << to_row) << (forest_rows - to_row);

    Ok((higher_bits | lower_bits) & max_position_mask(forest_rows))
}

/// Replaces every pair of deleted siblings by their (now deleted) parent, until no two
/// siblings are left. `nodes` must be sorted.
pub fn detwin(mut nodes: Vec<u64>, forest_rows: u8) -> Vec<u64> {
    let mut n = 0;

    while (n + 1) < nodes.len() {
        // If the next node in line is the current node's sibling
        // grab the parent as well
        let i = nodes[n];
        let j = nodes[n + 1];

        if is_right_sibling(i, j) {
            nodes.drain(n..n + 2);
            sorted_insert(&mut nodes, parent(i, forest_rows));
        } else {
            n += 1;
        }
    }

    nodes
}

// start_position_at_row returns the smallest position an accumulator can have for the
// requested row for the given numLeaves.
pub fn start_position_at_row(row: u8, forest_rows: u8) -> u64 {
    // 2 << forest_rows is 2 more than the max position
    // to get the correct offset for a given row,
    // subtract (2 << `row complement of forest_rows`) from (2 << forest_rows)
    (2 << forest_rows) - (2 << (forest_rows - row))
}

/// Re-encodes a position when the forest grows from `from_rows` to `to_rows` rows. Leaves
/// keep their position, everything above gets shifted into the new row ranges.
pub fn translate(position: u64, from_rows: u8, to_rows: u8) -> u64 {
    let row = detect_row(position, from_rows);
    if row == 0 {
        return position;
    }

    let offset = position - start_position_at_row(row, from_rows);
    offset + start_position_at_row(row, to_rows)
}

fn sorted_insert(nodes: &mut Vec<u64>, value: u64) {
    let idx = nodes.partition_point(|x| *x < value);
    nodes.insert(idx, value);
}

fn max_position_mask(forest_rows: u8) -> u64 {
    (2 << forest_rows) - 1
}

pub fn is_left_niece(position: u64) -> bool {
    position & 1 == 0
}
pub fn left_sibling(position: u64) -> u64 {
    (position | 1) ^ 1
}
/// The other child of our parent. Doesn't depend on the forest shape.
pub fn sibling(position: u64) -> u64 {
    position ^ 1
}

// roots_to_destroy returns the empty roots that get written over after num_adds
// amount of leaves have been added. Positions are in the forest after the additions.
pub fn roots_to_destroy<Hash: AccumulatorHash>(
    num_adds: u64,
    mut num_leaves: u64,
    orig_roots: &[Hash],
) -> Vec<u64> {
    let forest_rows = tree_rows(num_leaves + num_adds);
    let mut roots = orig_roots.to_vec();

    let mut deleted = vec![];
    for _ in 0..num_adds {
        let mut h = 0;
        while (num_leaves >> h) & 1 == 1 {
            if let Some(root) = roots.pop() {
                if root.is_empty() {
                    deleted.push(root_position(num_leaves, h, forest_rows));
                }
            }
            h += 1;
        }
        // Anything non-empty will do here
        roots.push(Hash::placeholder());
        num_leaves += 1;
    }

    deleted
}

pub fn num_roots(leaves: u64) -> usize {
    leaves.count_ones() as usize
}
// detectRow finds the current row of a node, given the position
// and the total forest rows.
pub fn detect_row(pos: u64, forest_rows: u8) -> u8 {
    let mut marker: u64 = 1 << forest_rows;
    let mut h: u8 = 0;

    while pos & marker != 0 {
        marker >>= 1;
        h += 1;
    }

    h
}

/// The row of `position` (0 is the leaf row) in a forest with `num_leaves` leaves.
pub fn row_of(position: u64, num_leaves: u64) -> u8 {
    detect_row(position, tree_rows(num_leaves))
}

/// The parent of `position` in a forest with `num_leaves` leaves.
pub fn parent_of(position: u64, num_leaves: u64) -> u64 {
    parent(position, tree_rows(num_leaves))
}

/// The position of the `tree_index`-th root, counting from the tallest tree. Returns `None`
/// if the forest doesn't have that many trees.
pub fn tree_root_position(tree_index: usize, num_leaves: u64) -> Option<u64> {
    let forest_rows = tree_rows(num_leaves);
    (0..=forest_rows)
        .rev()
        .filter(|row| num_leaves & (1 << row) != 0)
        .nth(tree_index)
        .map(|row| root_position(num_leaves, row, forest_rows))
}

// parent returns the parent position of the passed in child
pub fn parent(pos: u64, forest_rows: u8) -> u64 {
    (pos >> 1) | (1 << forest_rows)
}

pub fn left_child(pos: u64, forest_rows: u8) -> u64 {
    (pos << 1) & max_position_mask(forest_rows)
}

pub fn right_child(pos: u64, forest_rows: u8) -> u64 {
    left_child(pos, forest_rows) | 1
}

/// Tells whether `pos` names a node that exists in a forest with `num_leaves` leaves. It
/// walks down to the rightmost leaf under `pos` and checks that one exists.
pub fn in_forest(mut pos: u64, num_leaves: u64, forest_rows: u8) -> bool {
    // quick yes
    if pos < num_leaves {
        return true;
    }

    let marker = 1 << forest_rows;
    let mask = (marker << 1) - 1;

    if pos >= mask {
        return false;
    }

    while pos & marker != 0 {
        pos = ((pos << 1) & mask) | 1;
    }

    pos < num_leaves
}

// tree_rows returns the number of rows given n leaves
pub fn tree_rows(n: u64) -> u8 {
    if n == 0 {
        return 0;
    }

    (u64::BITS - (n - 1).leading_zeros()) as u8
}

// root_position returns the position of the root at a given row. The caller must make sure
// a root actually exists at this row.
pub fn root_position(num_leaves: u64, row: u8, forest_rows: u8) -> u64 {
    let mask = max_position_mask(forest_rows);
    let before = num_leaves & (mask << (row + 1));

    let shifted = (before >> row) | (mask << (forest_rows + 1 - row));
    shifted & mask
}

/// Returns the ancestor `rise` rows above `pos`.
pub fn parent_many(pos: u64, rise: u8, forest_rows: u8) -> Result<u64, UtreexoError> {
    if rise == 0 {
        return Ok(pos);
    }
    if rise > forest_rows {
        return Err(UtreexoError::Accumulator(format!(
            "Cannot rise more than the forestRows: rise: {rise} forest_rows: {forest_rows}"
        )));
    }
    let mask = max_position_mask(forest_rows);
    Ok((pos >> rise | (mask << (forest_rows - (rise - 1)))) & mask)
}

/// Whether `higher_pos` is a strict ancestor of `lower_pos`.
pub fn is_ancestor(higher_pos: u64, lower_pos: u64, forest_rows: u8) -> bool {
    if higher_pos == lower_pos {
        return false;
    }
    let lower_row = detect_row(lower_pos, forest_rows);
    let higher_row = detect_row(higher_pos, forest_rows);

    // Prevent underflows by checking that the higherRow is not less
    // than the lowerRow.
    if higher_row <= lower_row {
        return false;
    }

    match parent_many(lower_pos, higher_row - lower_row, forest_rows) {
        Ok(ancestor) => ancestor == higher_pos,
        Err(_) => false,
    }
}

/// Returns whether next is node's sibling or not
pub fn is_right_sibling(node: u64, next: u64) -> bool {
    node | 1 == next
}

/// Returns the positions whose hashes a proof for `targets` must carry, in the canonical
/// order: row by row from the leaves up, ascending inside each row.
pub fn get_proof_positions(targets: &[u64], num_leaves: u64, forest_rows: u8) -> Vec<u64> {
    let mut proof_positions = vec![];
    let mut computed_positions = targets.to_vec();
    computed_positions.sort_unstable();
    computed_positions.dedup();

    let mut i = 0;
    while i < computed_positions.len() {
        let node = computed_positions[i];
        i += 1;

        if is_root_position(node, num_leaves, forest_rows) {
            continue;
        }

        match computed_positions.get(i) {
            Some(next) if is_right_sibling(node, *next) => i += 1,
            _ => proof_positions.push(sibling(node)),
        }

        let parent = parent(node, forest_rows);
        if let Err(idx) = computed_positions.binary_search(&parent) {
            computed_positions.insert(idx, parent);
        }
    }

    proof_positions
}

#[cfg(test)]
pub fn hash_from_u8(value: u8) -> super::node_hash::BitcoinNodeHash {
    use bitcoin_hashes::sha256;
    use bitcoin_hashes::Hash;
    use bitcoin_hashes::HashEngine;

    let mut engine = sha256::Hash::engine();

    engine.input(&[value]);

    sha256::Hash::from_engine(engine).into()
}
