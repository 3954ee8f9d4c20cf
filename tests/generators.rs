//! Generator Tests
//!
//! Each generator runs against an on-disk project layout built in a temp dir.

use std::fs;
use std::path::Path;

use prompt_assembler_core::{
    chunk::{load_definitions, select_definitions, ChunkId},
    tenner::{load_tenner32, select_permutation, split_into_tables, write_tables, TennerMetadata},
    AssemblyPipeline, BundleWriter, EngineConfig, EngineError, SkeletonRegistry, TennerGenerator,
    TennerNumber, TennerSet,
};

fn write_ten(path: &Path, prefix: &str) {
    let mut csv = String::from("id,version,descriptor\n");
    for i in 0..10 {
        csv.push_str(&format!("{}{},1.0.0,{} {}\n", prefix, i, prefix, i));
    }
    fs::write(path, csv).unwrap();
}

fn create_project(root: &Path) -> EngineConfig {
    let config = EngineConfig::default().resolve(root);
    fs::create_dir_all(&config.data_dir).unwrap();
    fs::create_dir_all(&config.tenner_dir).unwrap();
    fs::create_dir_all(config.chunks_path.parent().unwrap()).unwrap();
    fs::create_dir_all(config.film_bible_path.parent().unwrap()).unwrap();

    fs::write(&config.film_bible_path, "FILM BIBLE\n").unwrap();
    fs::write(
        config.data_dir.join("poses.csv"),
        "id,version,descriptor,wardrobe_zones_allowed\np1,1.0.0,standing,torso;legs\n",
    )
    .unwrap();
    fs::write(
        config.data_dir.join("scenes.csv"),
        "id,version,descriptor,camera_framing\ns1,1.0.0,a meadow,full-body\n",
    )
    .unwrap();
    fs::write(
        config.data_dir.join("characters.csv"),
        "id,version,descriptor\nc1,1.0.0,A small lion\n",
    )
    .unwrap();

    write_ten(&config.data_dir.join("tenner_characters.csv"), "critter");
    write_ten(&config.data_dir.join("tenner_headwear.csv"), "hat");
    config
}

#[test]
fn test_tenner_generation_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_project(dir.path());
    let pipeline = AssemblyPipeline::from_config(&config).unwrap();

    let set = TennerSet::load(&config.data_dir, &["headwear", "character"]).unwrap();
    let generator = TennerGenerator::new(set).unwrap();
    assert_eq!(generator.len(), 100);

    let mut bundles = Vec::new();
    let report = pipeline.generate_tenner(&generator, Some(24), &mut bundles);
    assert_eq!(report.converted(), 24);
    let bundle = &bundles[23];
    assert_eq!(bundle.id, "tenner_00023");
    // headwear is the first category, so it takes the fast digit
    assert_eq!(
        bundle.assembled_prompt_text,
        "FILM BIBLE. critter 2. standing. hat 3. a meadow. \
         Photographed with full-body, 35mm lens, eye-level, 1m height, 5° downward tilt."
    );
    match &bundle.tenner_metadata {
        Some(TennerMetadata::Permutation { digits, items, .. }) => {
            assert_eq!(digits, &vec![3, 2]);
            assert_eq!(items["headwear"], "hat3");
        }
        other => panic!("unexpected metadata {:?}", other),
    }
}

#[test]
fn test_tenner_missing_category_source() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_project(dir.path());
    let err = TennerSet::load(&config.data_dir, &["garments"]).unwrap_err();
    assert!(matches!(err, EngineError::MissingSource { ref category, .. } if category == "garments"));
}

#[test]
fn test_chunks_with_skeleton_and_missing_component() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_project(dir.path());
    write_ten(&config.tenner_dir.join(TennerNumber(1).file_name()), "fox");
    write_ten(&config.tenner_dir.join(TennerNumber(11).file_name()), "scarf");

    fs::write(
        &config.chunks_path,
        r#"[
            {"CHUNK ID": "CHUNK1", "tenner_component_1": "T1", "tenner_component_2": "T11"},
            {"CHUNK ID": "CHUNK2", "tenner_componenet_1": "T5"}
        ]"#,
    )
    .unwrap();
    fs::write(
        &config.skeletons_path,
        r#"[{"SKELETON_1": "SKELETON_1", "text": "a <T1> in a <T11>"}]"#,
    )
    .unwrap();

    let pipeline = AssemblyPipeline::from_config(&config).unwrap();
    let definitions = load_definitions(&config.chunks_path).unwrap();
    let skeletons = SkeletonRegistry::load_from_file(&config.skeletons_path).unwrap();
    let (selected, missing) = select_definitions(&definitions, &[ChunkId(1), ChunkId(2), ChunkId(9)]);
    assert_eq!(missing, vec![ChunkId(9)]);

    let mut bundles = Vec::new();
    let report = pipeline.generate_chunks(&selected, &config.tenner_dir, &skeletons, &mut bundles);
    assert_eq!(report.converted(), 100);
    assert_eq!(report.errors(), 1);
    assert_eq!(report.failures[0].item, "CHUNK2");

    let first = &bundles[0];
    assert_eq!(first.id, "chunk_chunk1_perm_000");
    assert!(first.assembled_prompt_text.contains("standing. a fox 0 in a scarf 0. a meadow."));
    let meta = first.chunk_metadata.as_ref().unwrap();
    assert_eq!(meta.chunk_id, ChunkId(1));
    assert_eq!(meta.chunk_values, vec!["fox 0", "scarf 0"]);

    let json = serde_json::to_value(first).unwrap();
    assert_eq!(json["chunk_metadata"]["chunk_id"], "CHUNK1");
    assert_eq!(json["chunk_metadata"]["components"][1], "T11");
}

#[test]
fn test_tenner32_selection_and_conversion() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_project(dir.path());
    fs::write(
        &config.tenner32_path,
        r#"[
            {"option": 1, "TENNER 1 (T1)": "curious fox", "TENNER 2 (T2)": "red scarf"},
            {"option": 2, "TENNER 1 (T1)": "sleepy owl", "TENNER 3 (T3)": null}
        ]"#,
    )
    .unwrap();

    let options = load_tenner32(&config.tenner32_path).unwrap();
    assert!(matches!(
        select_permutation(&options, 5),
        Err(EngineError::PermutationOutOfRange { index: 5, .. })
    ));

    let pipeline = AssemblyPipeline::from_config(&config).unwrap();
    let bundle = select_permutation(&options, 0)
        .unwrap()
        .to_bundle(0, pipeline.composer(), pipeline.factory(), &pipeline.context())
        .unwrap();
    assert_eq!(bundle.id, "tenner32_permutation_00");
    assert!(bundle
        .assembled_prompt_text
        .starts_with("FILM BIBLE. standing. curious fox. red scarf. a meadow."));
    let meta = bundle.tenner32_metadata.unwrap();
    assert_eq!(meta.complete_tenners, 2);
    assert_eq!(meta.total_tenners, 32);

    let written = write_tables(&config.tenner_dir, &split_into_tables(&options)).unwrap();
    assert_eq!(written, 2);
    let t1 = fs::read_to_string(config.tenner_dir.join("tenner_01.csv")).unwrap();
    assert!(t1.starts_with("id,version,descriptor,option_index,notes\n"));
    assert!(t1.contains("tenner_01_01,1.0.0,sleepy owl,2,Tenner 1 option 2"));

    let mut bundles = Vec::new();
    let report = pipeline.generate_individual_tenners(
        &[TennerNumber(1), TennerNumber(3)],
        &config.tenner_dir,
        &mut bundles,
    );
    assert_eq!(report.converted(), 2);
    assert_eq!(bundles[1].id, "tenner_01_perm_001");
    assert_eq!(report.errors(), 1);
}

#[test]
fn test_tenner_bundles_stream_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_project(dir.path());
    let pipeline = AssemblyPipeline::from_config(&config).unwrap();
    let generator = TennerGenerator::new(TennerSet::load(&config.data_dir, &["character"]).unwrap()).unwrap();

    let out = dir.path().join("bundles");
    let mut writer = BundleWriter::create(&out).unwrap();
    let report = pipeline.generate_tenner(&generator, None, &mut writer);
    assert_eq!(report.converted(), 10);
    assert_eq!(writer.written(), 10);
    assert!(out.join("tenner_00009.json").exists());
}

#[test]
fn test_naive_timestamp_envelope_assembles() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_project(dir.path());
    let specs = dir.path().join("specs");
    fs::create_dir_all(&specs).unwrap();
    fs::write(
        specs.join("spec_0000_c1_p1_s1.json"),
        r#"{
            "id": "spec_0000",
            "version": "1.0.0",
            "created_at": "2025-01-01T12:00:00.123456",
            "spec": {
                "character": "c1", "pose": "p1", "orientation": null, "scene": "s1",
                "lighting": null, "model": null, "wardrobe": [], "props": [],
                "camera_override": null
            },
            "metadata": {"description": "Spec for c1", "tags": ["c1", "p1", "s1"], "status": "pending"}
        }"#,
    )
    .unwrap();

    let pipeline = AssemblyPipeline::from_config(&config).unwrap();
    let mut bundles = Vec::new();
    let report = pipeline.assemble_spec_dir(&specs, &mut bundles).unwrap();
    assert_eq!(report.errors(), 0, "{:?}", report.failures);
    assert_eq!(bundles[0].spec.character, "c1@1.0.0");
    assert!(bundles[0].assembled_prompt_text.contains("A small lion"));
}
