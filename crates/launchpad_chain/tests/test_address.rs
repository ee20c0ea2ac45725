use launchpad_chain::{
    NativeToken, derive_address, find_network, format_units, is_evm_address, to_checksum_address,
};

#[test]
fn derived_address_is_checksummed() {
    let key = format!("0x{}", "11".repeat(32));
    let address = derive_address(&key).unwrap();
    assert!(is_evm_address(&address));
    assert_eq!(to_checksum_address(&address.to_lowercase()).unwrap(), address);
    // Prefix is optional.
    assert_eq!(derive_address(&"11".repeat(32)).unwrap(), address);
}

#[test]
fn zero_key_is_rejected() {
    assert!(derive_address(&"00".repeat(32)).is_err());
}

#[test]
fn presets_carry_token_minimums() {
    let thanos = find_network("thanos-sepolia").unwrap();
    assert_eq!(thanos.native_token, NativeToken::Ton);
    assert_eq!(
        format_units(thanos.native_token.min_recommended_balance(), thanos.native_token.decimals()),
        "10.0"
    );

    let sepolia = find_network("sepolia").unwrap();
    assert_eq!(
        format_units(sepolia.native_token.min_recommended_balance(), 18),
        "0.05"
    );
    assert!(find_network("unknown").is_none());
}
