//! Golden vectors for the jetton payloads

use crate::payload::*;
use crate::tvm::*;
use num_bigint::BigInt;
use std::sync::Arc;

const WBTC_DEPLOY_DATA: &str = include_str!("fixtures/deploy_data_wbtc.boc.hex");
const WBTC_OWNER: &str = "UQDSLbwk6S37jKAqmHrNg6OHo6xBzEgm-FLALjNdQui92Ivo";
const WBTC_MASTER: &str = "EQBpw9TQO3UX8VTRAA8GiB7zL0rsvrywL8T1si4AcTEyP9Sy";

const MINT_RECEIVER: &str = "EQBGhqLAZseEqRXz4ByFPTGV7SVMlI4hrbs-Sps_Xzx01x8G";
const MINT_BOC: &str = "b5ee9c7201010101004800008bfc708bd20000000000000000000000000000000000000000000000000000000ba43b74004004686a2c066c784a915f3e01c853d3195ed254c948e21adbb3e4a9b3f5f3c74d78";

fn wbtc_params() -> JettonParams {
    JettonParams {
        name: "jetton of BTC ".to_string(),
        description: "This is a jetton version of BTC".to_string(),
        symbol: "WBTC".to_string(),
        image: "https://idhub-cdn.litentry.io/figma/image 1860.png".to_string(),
    }
}

fn wbtc_owner() -> Address {
    WBTC_OWNER.parse().unwrap()
}

#[test]
fn test_bundled_contract_cells() {
    assert_eq!(
        jetton_code_cell().unwrap().hash_hex(),
        "1b3cd70fa84d2819f0d44ac055da8060238caa521c85c65acc6ed77721ad6c13"
    );
    assert_eq!(
        jetton_system_cell().unwrap().hash_hex(),
        "34ee34e2f6dd9d27f4618b403439cf065e3e45b6fa9ba38e903f371dbfe9aa8d"
    );
}

#[test]
fn test_deploy_data_matches_recorded_boc() {
    let data = build_deploy_data(&wbtc_owner(), &BigInt::from(21_000_000), &wbtc_params()).unwrap();

    assert_eq!(
        data.hash_hex(),
        "443118301dca1d935874fbc666f8ab7da88f7da4b6f82816c1beaab3aa1eaece"
    );
    assert_eq!(boc_to_hex(&data, false).unwrap(), WBTC_DEPLOY_DATA.trim());

    let recorded = hex_to_boc(WBTC_DEPLOY_DATA).unwrap();
    assert_eq!(recorded.hash(), data.hash());
}

#[test]
fn test_deploy_data_field_order() {
    let data = build_deploy_data(&wbtc_owner(), &BigInt::from(21_000_000), &wbtc_params()).unwrap();
    // owner flag (1) + addr_std (267) + int257
    assert_eq!(data.bit_len(), 1 + 267 + 257);
    assert_eq!(data.reference_count(), 2);

    let decoded = ContractDeployData::from_cell(&data).unwrap();
    assert_eq!(decoded.system, jetton_system_cell().unwrap());
    assert!(!decoded.owner_flag);
    assert!(decoded.owner.same_account(&wbtc_owner()));
    assert_eq!(decoded.max_supply, BigInt::from(21_000_000));
    assert_eq!(
        decoded.content.hash_hex(),
        "e3ecdcbbe0aade1dc9964c1e8afbb6c354b0741daccf6ea4b0910a690a164c34"
    );

    match JettonContent::from_cell(&decoded.content).unwrap() {
        JettonContent::OnChain(content) => {
            assert_eq!(content.name, "jetton of BTC ");
            assert_eq!(content.symbol, "WBTC");
            assert_eq!(content.description, "This is a jetton version of BTC");
            assert_eq!(content.image, "https://idhub-cdn.litentry.io/figma/image 1860.png");
            assert_eq!(content.decimals, None);
        }
        other => panic!("expected on-chain content, got {other:?}"),
    }
}

#[test]
fn test_deployment_address() {
    let deployment = prepare_jetton_deployment(
        &wbtc_owner(),
        &BigInt::from(21_000_000),
        &wbtc_params(),
        0,
    )
    .unwrap();

    assert_eq!(
        deployment.state_init.to_cell().unwrap().hash_hex(),
        "69c3d4d03b7517f154d1000f06881ef32f4aecbebcb02fc4f5b22e007131323f"
    );
    assert_eq!(deployment.address.to_string(), WBTC_MASTER);
}

#[test]
fn test_state_init_layout() {
    let code = Arc::new(Cell::new());
    let mut data = Builder::new();
    data.store_u32(1).unwrap();
    let state_init = StateInit::new(code, data.build().unwrap());

    let cell = state_init.to_cell().unwrap();
    // 0 0 1 1 0
    assert_eq!(cell.bit_len(), 5);
    assert_eq!(cell.data(), &[0b0011_0000]);
    assert_eq!(cell.reference_count(), 2);
}

#[test]
fn test_mint_payload_golden() {
    let receiver: Address = MINT_RECEIVER.parse().unwrap();
    let cell = build_mint_payload(&BigInt::from(100_000_000_000u64), &receiver).unwrap();

    assert_eq!(cell.bit_len(), 556);
    assert_eq!(cell.reference_count(), 0);
    assert_eq!(boc_to_hex(&cell, false).unwrap(), MINT_BOC);
    assert_eq!(
        cell.hash_hex(),
        "ae28ae717b0e073a3c8e723d16b03634e59329d6c42b0814a8e895440aa4f0a3"
    );
}

#[test]
fn test_mint_builder_indirection_is_identical() {
    let receiver: Address = MINT_RECEIVER.parse().unwrap();
    let amount = BigInt::from(100_000_000_000u64);

    let mut inner = Builder::new();
    inner.store_u32(Opcode::Mint.code()).unwrap();
    inner.store_int_big(&amount, 257).unwrap();
    inner.store_address(Some(&receiver)).unwrap();

    let mut outer = Builder::new();
    outer.store_builder(&inner).unwrap();
    let indirect = outer.build().unwrap();

    let direct = build_mint_payload(&amount, &receiver).unwrap();
    assert_eq!(
        serialize_boc(&indirect, false).unwrap(),
        serialize_boc(&direct, false).unwrap()
    );
}

#[test]
fn test_mint_payload_is_deterministic() {
    let receiver = Address::new(-1, [0x5a; 32]);
    for amount in [0i64, 1, -1, 21_000_000, i64::MAX] {
        let amount = BigInt::from(amount);
        let first = serialize_boc(&build_mint_payload(&amount, &receiver).unwrap(), true).unwrap();
        let second = serialize_boc(&build_mint_payload(&amount, &receiver).unwrap(), true).unwrap();
        assert_eq!(first, second);

        let decoded =
            MintPayload::from_cell(&build_mint_payload(&amount, &receiver).unwrap()).unwrap();
        assert_eq!(decoded.amount, amount);
        assert_eq!(decoded.receiver, receiver);
    }
}

#[test]
fn test_mint_receiver_keeps_account_not_text_flags() {
    let receiver: Address = "UQDSLbwk6S37jKAqmHrNg6OHo6xBzEgm-FLALjNdQui92Ivo".parse().unwrap();
    assert!(!receiver.is_bounceable);

    let decoded =
        MintPayload::from_cell(&build_mint_payload(&BigInt::from(100), &receiver).unwrap())
            .unwrap();
    assert!(decoded.receiver.same_account(&receiver));
    assert_ne!(decoded.receiver, receiver);
    assert_eq!(decoded.receiver, receiver.with_bounceable(true));
}

#[test]
fn test_mint_payload_rejects_other_opcode() {
    let comment = build_text_comment("Mint: 100").unwrap();
    assert!(matches!(
        MintPayload::from_cell(&comment),
        Err(EncodingError::UnexpectedTag { tag: 0, .. })
    ));
}

#[test]
fn test_mint_amount_out_of_range() {
    let receiver = Address::new(0, [0; 32]);
    let too_big = BigInt::from(1) << 256;
    assert!(build_mint_payload(&too_big, &receiver).is_err());
    assert!(build_mint_payload(&(-too_big.clone()), &receiver).is_ok());
    assert!(build_mint_payload(&(-too_big - 1), &receiver).is_err());
}

#[test]
fn test_text_comment_golden() {
    let cell = build_text_comment("Mint: 100").unwrap();
    assert_eq!(
        boc_to_hex(&cell, false).unwrap(),
        "b5ee9c7201010101000f00001a000000004d696e743a20313030"
    );
    assert_eq!(parse_text_comment(&cell).unwrap(), "Mint: 100");
}

#[test]
fn test_long_text_comment_chains() {
    let text = "x".repeat(400);
    let cell = build_text_comment(&text).unwrap();
    // 4 opcode bytes leave 123 bytes in the head cell
    assert_eq!(cell.bit_len(), 127 * 8);
    assert_eq!(cell.reference_count(), 1);
    assert_eq!(parse_text_comment(&cell).unwrap(), text);
}

#[test]
fn test_offchain_content_golden() {
    let content = JettonContent::OffChain {
        uri: "https://example.com/jetton.json".to_string(),
    };
    let cell = content.to_cell().unwrap();
    assert_eq!(
        boc_to_hex(&cell, false).unwrap(),
        "b5ee9c720101010100220000400168747470733a2f2f6578616d706c652e636f6d2f6a6574746f6e2e6a736f6e"
    );
    assert_eq!(JettonContent::from_cell(&cell).unwrap(), content);
    assert_eq!(content.decimals(), 9);
}

#[test]
fn test_build_jetton_content_matches_params() {
    let params = wbtc_params();
    let direct =
        build_jetton_content(&params.name, &params.description, &params.symbol, &params.image)
            .unwrap();
    assert_eq!(direct, params.content().to_cell().unwrap());
    assert_eq!(
        direct.hash_hex(),
        "e3ecdcbbe0aade1dc9964c1e8afbb6c354b0741daccf6ea4b0910a690a164c34"
    );
}

#[test]
fn test_onchain_content_roundtrip_with_optional_fields() {
    let content = OnChainContent {
        name: "Long".to_string(),
        description: "d".repeat(500),
        symbol: "LNG".to_string(),
        image: String::new(),
        decimals: Some(6),
        uri: Some("ipfs://meta".to_string()),
        image_data: Some(vec![0x89, 0x50, 0x4e, 0x47]),
        extra: Default::default(),
    };
    let wrapped = JettonContent::OnChain(content.clone());
    let cell = wrapped.to_cell().unwrap();

    let decoded = JettonContent::from_cell(&cell).unwrap();
    assert_eq!(decoded, wrapped);
    assert_eq!(decoded.decimals(), 6);

    let mut slice = Slice::new(cell);
    assert_eq!(slice.load_byte().unwrap(), 0x00);
    // empty image is not stored
    assert_eq!(slice.load_dict(256).unwrap().len(), 6);
}

#[test]
fn test_unknown_content_prefix() {
    let mut builder = Builder::new();
    builder.store_byte(0x02).unwrap();
    let cell = builder.build().unwrap();
    assert!(matches!(
        JettonContent::from_cell(&cell),
        Err(EncodingError::UnexpectedTag { tag: 2, .. })
    ));
}

#[test]
fn test_jetton_transfer_golden() {
    let destination: Address = MINT_RECEIVER.parse().unwrap();
    let mut transfer = JettonTransfer::new(Coins::from_nano(1_000_000_000).unwrap(), destination);
    transfer.query_id = 7;

    let cell = transfer.to_cell().unwrap();
    assert_eq!(cell.bit_len(), 407);
    assert_eq!(
        boc_to_hex(&cell, false).unwrap(),
        "b5ee9c720101010100350000650f8a7ea5000000000000000743b9aca008008d0d4580cd8f09522be7c0390a7a632bda4a99291c435b767c95367ebe78e9ae01"
    );
    assert_eq!(
        cell.hash_hex(),
        "00f21fa00362b37ca36084e62d5461de8dc6fcc13a6e5fa3723a51a0350d7812"
    );
}

#[test]
fn test_jetton_transfer_with_forward_payload() {
    let destination: Address = MINT_RECEIVER.parse().unwrap();
    let mut comment = Builder::new();
    comment.store_u32(0).unwrap();
    comment.store_string("hi").unwrap();

    let transfer = JettonTransfer {
        query_id: 7,
        amount: Coins::from_nano(1_000_000_000).unwrap(),
        destination,
        response_destination: Some(destination),
        custom_payload: None,
        forward_ton_amount: Coins::from_nano(1).unwrap(),
        forward_payload: Some(comment.build().unwrap()),
    };
    let cell = transfer.to_cell().unwrap();
    assert_eq!(cell.reference_count(), 1);
    assert_eq!(
        cell.hash_hex(),
        "716e2f6efb0c718e9ddd3ecb13cf30244305fd25b8d09b0f65352e6123e6fb4e"
    );
}
