use cellkit_boc::{from_boc, one_from_boc, to_boc, BocOptions};
use cellkit_core::{CellGraph, CellId};
use proptest::prelude::*;

/// Per cell: data bytes, extra trailing bits, and picks for child cells.
type CellSpec = (Vec<u8>, Vec<bool>, Vec<prop::sample::Index>);

fn cell_specs() -> impl Strategy<Value = Vec<CellSpec>> {
    prop::collection::vec(
        (
            prop::collection::vec(0u8..4, 0..6),
            prop::collection::vec(any::<bool>(), 0..8),
            prop::collection::vec(any::<prop::sample::Index>(), 0..=4),
        ),
        1..24,
    )
}

/// Cell `i` may only reference cells built before it, so the graph is
/// acyclic. The narrow byte alphabet produces plenty of equal sub-trees.
fn build(specs: &[CellSpec]) -> (CellGraph, CellId) {
    let mut graph = CellGraph::new();
    let mut ids = Vec::new();
    for (bytes, bits, picks) in specs {
        let id = graph.new_cell();
        let data = graph.bits_mut(id).unwrap();
        data.write_bytes(bytes).unwrap();
        data.write_bit_array(bits).unwrap();
        if !ids.is_empty() {
            for pick in picks {
                let child = ids[pick.index(ids.len())];
                graph.push_ref(id, child).unwrap();
            }
        }
        ids.push(id);
    }
    (graph, *ids.last().unwrap())
}

proptest! {
    #[test]
    fn random_trees_round_trip(
        specs in cell_specs(),
        has_idx in any::<bool>(),
        has_crc32c in any::<bool>(),
        has_cache_bits in any::<bool>(),
    ) {
        let (graph, root) = build(&specs);
        let options = BocOptions { has_idx, has_crc32c, has_cache_bits, flags: 0 };
        let bytes = to_boc(&graph, root, &options).unwrap();

        let (decoded, decoded_root) = one_from_boc(&bytes).unwrap();
        prop_assert_eq!(decoded.hash(decoded_root).unwrap(), graph.hash(root).unwrap());
        prop_assert_eq!(
            decoded.max_depth(decoded_root).unwrap(),
            graph.max_depth(root).unwrap()
        );

        // Decoded graphs are already deduplicated, so re-encoding is stable.
        let again = to_boc(&decoded, decoded_root, &options).unwrap();
        prop_assert_eq!(again, bytes);
    }

    #[test]
    fn random_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = from_boc(&bytes);
    }

    #[test]
    fn corrupted_boc_never_panics(
        specs in cell_specs(),
        position in any::<prop::sample::Index>(),
        mask in 1u8..,
    ) {
        let (graph, root) = build(&specs);
        let options = BocOptions { has_crc32c: false, ..BocOptions::default() };
        let mut bytes = to_boc(&graph, root, &options).unwrap();
        let at = position.index(bytes.len());
        bytes[at] ^= mask;
        let _ = from_boc(&bytes);
    }
}
