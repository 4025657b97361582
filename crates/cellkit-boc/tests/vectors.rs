use cellkit_boc::{from_boc_hex, one_from_boc, to_boc, BocOptions};
use cellkit_core::hash_base64;

/// Wallet v4r2 code: 20 cells, CRC, no index, `off_bytes = 2`.
const WALLET_V4R2_CODE: &str = concat!(
    "B5EE9C72410214010002D4000114FF00F4A413F4BCF2C80B010201200203020148040504F8F28308D71820D31FD31FD3",
    "1F02F823BBF264ED44D0D31FD31FD3FFF404D15143BAF2A15151BAF2A205F901541064F910F2A3F80024A4C8CB1F5240",
    "CB1F5230CBFF5210F400C9ED54F80F01D30721C0009F6C519320D74A96D307D402FB00E830E021C001E30021C002E300",
    "01C0039130E30D03A4C8CB1F12CB1FCBFF1011121302E6D001D0D3032171B0925F04E022D749C120925F04E002D31F21",
    "8210706C7567BD22821064737472BDB0925F05E003FA403020FA4401C8CA07CBFFC9D0ED44D0810140D721F404305C81",
    "0108F40A6FA131B3925F07E005D33FC8258210706C7567BA923830E30D03821064737472BA925F06E30D060702012008",
    "09007801FA00F40430F8276F2230500AA121BEF2E0508210706C7567831EB17080185004CB0526CF1658FA0219F400CB",
    "6917CB1F5260CB3F20C98040FB0006008A5004810108F45930ED44D0810140D720C801CF16F400C9ED540172B08E2382",
    "1064737472831EB17080185005CB055003CF1623FA0213CB6ACB1FCB3FC98040FB00925F03E20201200A0B0059BD242B",
    "6F6A2684080A06B90FA0218470D4080847A4937D29910CE6903E9FF9837812801B7810148987159F31840201580C0D00",
    "11B8C97ED44D0D70B1F8003DB29DFB513420405035C87D010C00B23281F2FFF274006040423D029BE84C600201200E0F",
    "0019ADCE76A26840206B90EB85FFC00019AF1DF6A26840106B90EB858FC0006ED207FA00D4D422F90005C8CA0715CBFF",
    "C9D077748018C8CB05CB0222CF165005FA0214CB6B12CCCCC973FB00C84014810108F451F2A7020070810108D718FA00",
    "D33FC8542047810108F451F2A782106E6F746570748018C8CB05CB025006CF165004FA0214CB6A12CB1FCB3FC973FB00",
    "02006C810108D718FA00D33F305224810108F459F2A782106473747270748018C8CB05CB025005CF165003FA0213CB6A",
    "CB1F12CB3FC973FB00000AF400C9ED54696225E5",
);

const WALLET_V4R2_CODE_HASH: &str = "/rX/aCDi/w2Ug+fg1iyBfYRniftK5YDIeIZtlZ2r1cA=";

#[test]
fn decodes_reference_wallet_code() {
    let bag = from_boc_hex(WALLET_V4R2_CODE).unwrap();
    assert_eq!(bag.header.cells_num, 20);
    assert_eq!(bag.header.off_bytes, 2);
    assert_eq!(bag.header.tot_cells_size, 0x02D4);
    assert_eq!(bag.roots.len(), 1);

    let root = bag.roots[0];
    assert_eq!(hash_base64(&bag.graph.hash(root).unwrap()), WALLET_V4R2_CODE_HASH);
    assert_eq!(bag.graph.max_depth(root).unwrap(), 7);
}

#[test]
fn reencoded_wallet_code_keeps_its_hash() {
    let bag = from_boc_hex(WALLET_V4R2_CODE).unwrap();
    let bytes = to_boc(&bag.graph, bag.roots[0], &BocOptions::default()).unwrap();

    let (graph, root) = one_from_boc(&bytes).unwrap();
    assert_eq!(graph.len(), 20);
    assert_eq!(hash_base64(&graph.hash(root).unwrap()), WALLET_V4R2_CODE_HASH);
}

#[test]
fn code_cell_starts_with_selector() {
    let bag = from_boc_hex(WALLET_V4R2_CODE).unwrap();
    let mut slice = bag.graph.parse(bag.roots[0]).unwrap();
    assert_eq!(slice.load_u64(8).unwrap(), 0xFF);
    assert_eq!(slice.remaining_refs(), 1);
    let first = slice.load_ref().unwrap();
    assert_eq!(bag.graph.cell(first).unwrap().refs().len(), 2);
}
