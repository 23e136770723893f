//! What goes into the accumulator is the hash of a [LeafData], a record of the output being
//! committed to, where it was created and at which height. Whoever spends the output hands
//! the record over, and the verifier recomputes the leaf hash from it.

use tracing::info;
use tracing_subscriber::EnvFilter;
use utreexo_stump::accumulator::leaf_data::LeafData;
use utreexo_stump::accumulator::leaf_data::OutPoint;
use utreexo_stump::accumulator::leaf_data::TxOut;
use utreexo_stump::accumulator::proof::Proof;
use utreexo_stump::accumulator::stump::Stump;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let block_hash = [0x42; 32];
    // A coinbase paying to two outputs, and a regular transaction
    let leaves: Vec<LeafData> = (0..3_u32)
        .map(|vout| {
            LeafData::new(
                block_hash,
                OutPoint {
                    tx_id: [vout as u8 / 2; 32],
                    vout: vout % 2,
                },
                840_000,
                vout < 2,
                TxOut {
                    value: 1_000 * (vout as u64 + 1),
                    script_pubkey: vec![0x51],
                },
            )
            .unwrap()
        })
        .collect();
    let hashes: Vec<_> = leaves.iter().map(LeafData::leaf_hash).collect();

    let (s, update_data) = Stump::new()
        .modify(&hashes, &[], &Proof::default())
        .unwrap();
    let (proof, cached) = Proof::default()
        .update(vec![], hashes, vec![], vec![2], update_data)
        .unwrap();

    // The spender only sends the record and the proof
    let spent = &leaves[2];
    info!(
        height = spent.height(),
        coinbase = spent.is_coinbase(),
        "spending {}",
        spent.leaf_hash()
    );
    assert_eq!(cached, vec![spent.leaf_hash()]);
    assert!(s.verify(&proof, &[spent.leaf_hash()]).unwrap());

    // Lying about any field gives a different leaf
    let mut forged = spent.clone();
    forged.utxo.value += 1;
    assert_eq!(s.verify(&proof, &[forged.leaf_hash()]), Ok(false));
}
