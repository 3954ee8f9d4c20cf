//! Contract Invariant Tests
//!
//! These tests verify the non-negotiable guarantees.

use prompt_assembler_core::{
    bundle::BundleFactory,
    chunk::{ChunkCombinationGenerator, ChunkDefinition, ChunkId},
    composer::PromptComposer,
    hashing::{canonical_json, inputs_checksum},
    matrix::is_wardrobe_compatible,
    resolve, AssetRecord, AssetStore, Category, EngineError, Spec, TennerNumber,
};
use proptest::prelude::*;
use prompt_assembler_core::tenner::{decode, encode};

fn create_store() -> AssetStore {
    AssetStore::default()
        .with(
            Category::Characters,
            vec![AssetRecord::new("c1").with("descriptor", "A small lion")],
        )
        .with(
            Category::Poses,
            vec![AssetRecord::new("p1").with("descriptor", "standing")],
        )
        .with(
            Category::Scenes,
            vec![AssetRecord::new("s1")
                .with("descriptor", "a meadow")
                .with("camera_framing", "full-body")],
        )
        .with(
            Category::Wardrobe,
            vec![
                AssetRecord::new("w1").with("descriptor", "red cap"),
                AssetRecord::new("w2").with("descriptor", "blue scarf"),
            ],
        )
}

fn build(store: &AssetStore, spec: &Spec) -> prompt_assembler_core::Bundle {
    let resolved = resolve(spec, store).unwrap();
    let text = PromptComposer::new("FILM BIBLE").compose(&resolved);
    BundleFactory::default().build(&resolved, text).unwrap()
}

#[test]
fn invariant_end_to_end_prompt_text() {
    let store = create_store();
    let bundle = build(&store, &Spec::new("c1", "p1", "s1"));
    assert_eq!(
        bundle.assembled_prompt_text,
        "FILM BIBLE. A small lion. standing. a meadow. \
         Photographed with full-body, 35mm lens, eye-level, 1m height, 5° downward tilt."
    );
}

#[test]
fn invariant_bundle_construction_deterministic() {
    let store = create_store();
    let mut spec = Spec::new("c1", "p1", "s1");
    spec.wardrobe = vec!["w1".into()];

    let a = build(&store, &spec);
    let b = build(&store, &spec);
    assert_eq!(a.assembled_prompt_text, b.assembled_prompt_text);
    assert_eq!(a.seed, b.seed);
    assert_eq!(a.inputs_checksum, b.inputs_checksum);
    assert_eq!(a.id, b.id);
    assert_eq!(a.seed.len(), 32);
}

#[test]
fn invariant_checksum_sensitive_to_spec_changes() {
    let store = create_store();
    let base = build(&store, &Spec::new("c1", "p1", "s1"));

    let mut with_wardrobe = Spec::new("c1", "p1", "s1");
    with_wardrobe.wardrobe = vec!["w2".into()];
    let changed = build(&store, &with_wardrobe);

    assert_ne!(base.inputs_checksum, changed.inputs_checksum);
    assert_ne!(base.id, changed.id);
}

#[test]
fn invariant_canonical_json_ignores_field_order() {
    let a: serde_json::Value =
        serde_json::from_str(r#"{"scene":"s1@1.0.0","character":"c1@1.0.0","wardrobe":[]}"#)
            .unwrap();
    let b: serde_json::Value =
        serde_json::from_str(r#"{"character":"c1@1.0.0","wardrobe":[],"scene":"s1@1.0.0"}"#)
            .unwrap();
    assert_eq!(canonical_json(&a).unwrap(), canonical_json(&b).unwrap());
    assert_eq!(inputs_checksum(&a).unwrap(), inputs_checksum(&b).unwrap());
}

#[test]
fn invariant_missing_character_is_fatal() {
    let store = create_store();
    match resolve(&Spec::new("ghost", "p1", "s1"), &store) {
        Err(EngineError::MissingAsset { category, id }) => {
            assert_eq!(category, "character");
            assert_eq!(id, "ghost");
        }
        other => panic!("expected MissingAsset, got {:?}", other.map(|r| r.spec)),
    }
}

#[test]
fn invariant_missing_wardrobe_is_skipped() {
    let store = create_store();
    let mut spec = Spec::new("c1", "p1", "s1");
    spec.wardrobe = vec!["w1".into(), "nope".into(), "w2".into()];
    let resolved = resolve(&spec, &store).unwrap();
    assert_eq!(resolved.wardrobe.len(), 2);

    spec.wardrobe = vec!["w1".into(), "nope".into()];
    let resolved = resolve(&spec, &store).unwrap();
    assert_eq!(resolved.wardrobe.len(), 1);
}

#[test]
fn invariant_wardrobe_compatibility() {
    let shirt = AssetRecord::new("shirt").with("zones", vec!["torso"]);
    let standing = AssetRecord::new("p1").with("wardrobe_zones_allowed", vec!["torso", "legs"]);
    let headstand = AssetRecord::new("p2").with("wardrobe_zones_allowed", vec!["head"]);
    assert!(is_wardrobe_compatible(&shirt, &standing));
    assert!(!is_wardrobe_compatible(&shirt, &headstand));
}

#[test]
fn invariant_tenner_digit_decoding() {
    assert_eq!(decode(23, 2), vec![3, 2]);

    let mut seen = std::collections::HashSet::new();
    for i in 0..1000u64 {
        let digits = decode(i, 3);
        assert!(digits.iter().all(|&d| d < 10));
        assert!(seen.insert(digits));
    }
    assert_eq!(seen.len(), 1000);
}

#[test]
fn invariant_chunk_skip_rule() {
    let chunk = ChunkDefinition::new(ChunkId(1), vec![TennerNumber(1), TennerNumber(2)]);
    let full: Vec<String> = (0..10).map(|i| format!("a{}", i)).collect();
    let mut gapped: Vec<String> = (0..10).map(|i| format!("b{}", i)).collect();
    gapped[3] = String::new();

    let generator = ChunkCombinationGenerator::new(&chunk, vec![full, gapped], None);
    assert_eq!(generator.iter().count(), 90);
}

proptest! {
    #[test]
    fn invariant_decode_is_bijective(index in 0u64..10_000_000_000, n in 10usize..=19) {
        let digits = decode(index, n);
        prop_assert_eq!(digits.len(), n);
        prop_assert_eq!(encode(&digits), Some(index));
    }
}
