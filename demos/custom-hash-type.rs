//! All data structures in this library are generic over the hash type used, defaulting to
//! [BitcoinNodeHash](utreexo_stump::accumulator::node_hash::BitcoinNodeHash), the one used by
//! Bitcoin. However, if you need to use a different hash type, you can implement the
//! [AccumulatorHash](utreexo_stump::accumulator::node_hash::AccumulatorHash) trait for it, and
//! use it with the accumulator data structures.
//!
//! A hash that is cheap inside a circuit, like [Poseidon](https://eprint.iacr.org/2019/458.pdf),
//! gives you smaller zero-knowledge proofs than the sha512-256 we use by default. To keep this
//! example self-contained we use a toy hash instead, it is NOT collision resistant. Swap
//! [CustomHash::parent_hash] for a real one and everything else stays the same.

use tracing::info;
use tracing_subscriber::EnvFilter;
use utreexo_stump::accumulator::node_hash::AccumulatorHash;
use utreexo_stump::accumulator::proof::Proof;
use utreexo_stump::accumulator::stump::Stump;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// We need a stateful wrapper around the actual hash, because the accumulator needs to tell
/// real values apart from deleted nodes and from nodes it doesn't care about.
enum CustomHash {
    /// An actual value
    Hash([u8; 32]),
    /// A node that exists, but whose value doesn't matter. [AccumulatorHash::is_placeholder]
    /// must return true for whatever [AccumulatorHash::placeholder] returns.
    Placeholder,
    #[default]
    /// A deleted node. Same rules as the placeholder, for [AccumulatorHash::is_empty] and
    /// [AccumulatorHash::empty].
    Empty,
}

impl std::fmt::Display for CustomHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hash(h) => {
                for byte in h.iter() {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Self::Placeholder => write!(f, "Placeholder"),
            Self::Empty => write!(f, "Empty"),
        }
    }
}

impl AccumulatorHash for CustomHash {
    fn placeholder() -> Self {
        Self::Placeholder
    }

    fn empty() -> Self {
        Self::Empty
    }

    fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }

    fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    // Only used by proof serialization. Sentinels never go on the wire.
    fn write<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: std::io::Write,
    {
        match self {
            Self::Hash(h) => writer.write_all(h),
            _ => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "can't serialize a sentinel hash",
            )),
        }
    }

    fn read<R>(reader: &mut R) -> std::io::Result<Self>
    where
        R: std::io::Read,
    {
        let mut h = [0u8; 32];
        reader.read_exact(&mut h)?;
        Ok(Self::Hash(h))
    }

    // This is consensus critical: everyone sharing an accumulator must combine nodes the
    // exact same way. It is never called with an empty child.
    fn parent_hash(left: &Self, right: &Self) -> Self {
        match (left, right) {
            (Self::Hash(l), Self::Hash(r)) => {
                let mut h = [0u8; 32];
                for i in 0..32 {
                    h[i] = l[i].rotate_left(3) ^ r[(i + 1) % 32] ^ (i as u8);
                }
                Self::Hash(h)
            }
            _ => Self::Placeholder,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let elements: Vec<_> = (1..=5_u8).map(|i| CustomHash::Hash([i; 32])).collect();

    // Add the elements, and start tracking the first and the last one
    let (s, update_data) = Stump::<CustomHash>::new_empty()
        .modify(&elements, &[], &Proof::default())
        .unwrap();
    let (proof, cached) = Proof::default()
        .update(vec![], elements.clone(), vec![], vec![0, 4], update_data)
        .unwrap();
    info!(targets = ?proof.targets(), "tracking two elements");

    // check that the proof has exactly two targets, and that it is valid
    assert_eq!(proof.n_targets(), 2);
    assert!(s.verify(&proof, &cached).unwrap());

    // Spend the first element, the other one stays provable
    let spend = proof.get_proof_subset(&cached, &[0], s.num_leaves()).unwrap();
    let (s, update_data) = s.modify(&[], &[elements[0]], &spend).unwrap();
    let (proof, cached) = proof
        .update(cached, vec![], vec![0], vec![], update_data)
        .unwrap();

    assert_eq!(cached, vec![elements[4]]);
    assert!(s.verify(&proof, &cached).unwrap());
    info!("{s}");
}
