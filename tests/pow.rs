//! Header hashing and target checks through the public API

use yespow::{
    HEADER_SIZE, NONCE_OFFSET, Params, PowHasher, Target, leading_zero_bits, meets_difficulty,
    meets_target, pow_hash,
};

fn small_params() -> Params {
    Params::builder().n(32).r(1).sbox_bytes(64).build().unwrap()
}

#[test]
fn test_pow_hash_yenten_vectors() {
    let header: Vec<u8> = (0..HEADER_SIZE as u8).collect();
    assert_eq!(
        hex::encode(pow_hash(&header).unwrap()),
        "7afa188a01edf6936a1f299884c2b57d52a87439d8b896f87cc27ed51616a136"
    );
    assert_eq!(
        hex::encode(pow_hash(&[0u8; HEADER_SIZE]).unwrap()),
        "16df000d21a328d973660bb448634eadc9ad8efcca111ef2741c00b941e0acc5"
    );
}

#[test]
fn test_hasher_matches_pow_hash() {
    let header = [7u8; HEADER_SIZE];
    let mut hasher = PowHasher::yenten().unwrap();
    assert_eq!(hasher.hash(&header), pow_hash(&header).unwrap());
}

#[test]
fn test_nonce_changes_digest() {
    let mut hasher = PowHasher::new(small_params()).unwrap();
    let mut header = [0u8; HEADER_SIZE];

    let a = hasher.hash_with_nonce(&mut header, 0);
    let b = hasher.hash_with_nonce(&mut header, 1);
    assert_ne!(a, b);
    assert_eq!(header[NONCE_OFFSET..], 1u32.to_le_bytes());
}

#[test]
fn test_search_finds_easy_target() {
    let mut hasher = PowHasher::new(small_params()).unwrap();
    let target = Target::from_leading_zero_bits(4).unwrap();
    let mut header = [0x5au8; HEADER_SIZE];

    // 1 in 16 chance per nonce; 400 misses in a row is vanishingly unlikely
    let found = (0..400u32).find_map(|nonce| {
        let digest = hasher.hash_with_nonce(&mut header, nonce);
        meets_target(&digest, &target).then_some((nonce, digest))
    });
    let (nonce, digest) = found.expect("no nonce met a 4-bit target");

    assert!(meets_difficulty(&digest, 4));
    assert!(leading_zero_bits(&digest) >= 4);
    assert_eq!(hasher.hash_with_nonce(&mut header, nonce), digest);
}

#[test]
fn test_difficulty_and_target_agree() {
    let mut hasher = PowHasher::new(small_params()).unwrap();
    let mut header = [0u8; HEADER_SIZE];

    for nonce in 0..32 {
        let digest = hasher.hash_with_nonce(&mut header, nonce);
        for bits in [0, 1, 2, 3, 8] {
            let target = Target::from_leading_zero_bits(bits).unwrap();
            assert_eq!(meets_target(&digest, &target), meets_difficulty(&digest, bits));
        }
    }
}

#[test]
fn test_compact_target_parsing() {
    let genesis: Target = "1d00ffff".parse().unwrap();
    assert_eq!(
        genesis.to_string(),
        "00000000ffff0000000000000000000000000000000000000000000000000000"
    );
    assert!(genesis < Target::from_leading_zero_bits(31).unwrap());
    assert!(genesis > Target::from_leading_zero_bits(33).unwrap());

    assert!("0x1d80ffff".parse::<Target>().is_err());
    assert!("".parse::<Target>().is_err());
}
