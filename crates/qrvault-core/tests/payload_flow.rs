//! End-to-end payload interpretation: classify, canonicalize, pick fingerprint bytes

use qrvault_core::{canonicalize, classify, fingerprint_input, AccountMap, Category, Error};

const XPUB_A: &str = "xpub6DYLEEVVRQGs2Jdb9mDX4GkrkGtmkQFtaLagKy7xCi8Q18CLUYwfmdUNEVpC9WfxK34vRtKjTcYmPLUFQaVaRc2m2HQpvUWeoAKT8TGRys3";
const XPUB_B: &str = "xpub6DYm3xyapVjA6AxYZSUrjTDvtRSZufCswQ4pJvPMKWAQ3mfwaPnxjgnwzPggnfMVYf5pSAtbgLeoi9h7NUiu31f2toyyKUkPsk58pBgKb2i";
const ZPUB_A: &str = "Zpub746wxoZmHivC9UBCm9FkJXHfp1DvqzvUiqGnp2BGLViZjWPhkGf56sea5cgqhmChMnNWoRWyG9eNH5K99CUZAZWdbRv5VhcdELicVSJ3sto";
const ZPUB_B: &str = "Zpub747NnY3rgpNVDLWAApX5yhkjx9mj1FsU5tkvnySfTHkZn9sJr7WN4vy9qWZLLutEbQPQoi5qUskQbtY176hsmy8uTxVDthrNJvUJBDj8nBT";

fn account_map_json(descriptor: &str) -> Vec<u8> {
    serde_json::json!({
        "descriptor": descriptor,
        "blockheight": 700000,
        "label": "Shared vault",
    })
    .to_string()
    .into_bytes()
}

#[test]
fn test_sortedmulti_example() {
    let input = format!("sh(sortedmulti(2,[abcd1234/0]{},[ef001122/0]{}))", XPUB_B, XPUB_A);
    let canonical = canonicalize(&input).unwrap();
    assert_eq!(
        canonical.as_str(),
        format!("sh(sortedmulti(2,[ef001122/0]{},[abcd1234/0]{}))", XPUB_A, XPUB_B)
    );
}

#[test]
fn test_reordered_account_maps_fingerprint_identically() {
    let first = account_map_json(&format!(
        "wsh(sortedmulti(2,[11111111/48h/0h/0h/2h]{}/0/*,[22222222/48h/0h/0h/2h]{}/0/*))#7qwp2y5l",
        ZPUB_B, ZPUB_A
    ));
    let second = account_map_json(&format!(
        "wsh(sortedmulti(2,[22222222/48h/0h/0h/2h]{}/0/*,[11111111/48h/0h/0h/2h]{}/0/*))",
        ZPUB_A, ZPUB_B
    ));

    assert_ne!(first, second);
    assert_eq!(classify(&first), Category::AccountMap);
    assert_eq!(classify(&second), Category::AccountMap);

    let a = fingerprint_input(&first, Category::AccountMap);
    let b = fingerprint_input(&second, Category::AccountMap);
    assert_eq!(a, b);

    let map = AccountMap::parse(&first).unwrap();
    assert_eq!(map.label.as_deref(), Some("Shared vault"));
    assert_eq!(map.canonical_descriptor().unwrap().as_bytes(), a.as_slice());
}

#[test]
fn test_account_map_with_bad_key_fingerprints_raw_bytes() {
    let raw = account_map_json(&format!("wsh(sortedmulti(1,{},xpubBROKEN))", XPUB_A));
    assert_eq!(classify(&raw), Category::AccountMap);
    assert_eq!(fingerprint_input(&raw, Category::AccountMap), raw);

    let map = AccountMap::parse(&raw).unwrap();
    assert!(matches!(map.canonical_descriptor(), Err(Error::DescriptorParse(_))));
}

#[test]
fn test_json_without_blockheight_is_text() {
    let raw = br#"{"descriptor":"wsh(sortedmulti(2,a,b))","label":"x"}"#;
    assert_eq!(classify(raw), Category::PlainText);
}

#[test]
fn test_classification_order() {
    let cases: &[(&[u8], Category)] = &[
        (b"cHNidP8BAAoCAAAAAAAAAAAAAA==", Category::Psbt),
        (b"3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy", Category::Address),
        (b"tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx", Category::Address),
        (b"legal winner thank year wave sausage worth useful legal winner thank yellow", Category::SeedWords),
        (b"ur:crypto-psbt/hdcxlkahssqzwfvslofzoxwkrewngotktbmwjkwdcmnefsaaehrlolkskncnktlbaypkrphsmyid", Category::Uri),
        (b"Meet at noon", Category::PlainText),
        (&[0xc3, 0x28], Category::Unknown),
    ];

    for (payload, expected) in cases {
        assert_eq!(classify(payload), *expected, "payload {:?}", payload);
    }
}

#[test]
fn test_deeply_nested_account_map_falls_back_to_raw_bytes() {
    let depth = 100_000;
    let descriptor = format!("{}x{}", "a(".repeat(depth), ")".repeat(depth));
    let payload = account_map_json(&descriptor);

    assert_eq!(classify(&payload), Category::AccountMap);
    let map = AccountMap::parse(&payload).unwrap();
    assert!(matches!(map.canonical_descriptor(), Err(Error::DescriptorParse(_))));
    assert_eq!(fingerprint_input(&payload, Category::AccountMap), payload);
}
