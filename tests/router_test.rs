//! Integration tests for cross-archive routing

use pakroute::records::level::{AreaRef, LayerFlags, LevelManifest};
use pakroute::records::strtab::{LanguageTable, StringTable, ENGL};
use pakroute::records::{AreaPayload, WorldMap};
use pakroute::{
    BinaryRecord, ExtractorRegistry, FourCc, MemorySource, PakArchive, PakBuilder, ProjectPath,
    ResourceRouter, UniqueId64,
};
use std::path::Path;

const STRG: FourCc = FourCc::new(b"STRG");
const MAPW: FourCc = FourCc::new(b"MAPW");
const MLVL: FourCc = FourCc::new(b"MLVL");
const AREA: FourCc = FourCc::new(b"AREA");
const TXTR: FourCc = FourCc::new(b"TXTR");

fn strg(strings: &[&str]) -> Vec<u8> {
    StringTable {
        languages: vec![LanguageTable {
            lang: ENGL,
            strings: strings.iter().map(|s| s.to_string()).collect(),
        }],
    }
    .to_bytes()
    .unwrap()
}

fn flat_archive(name: &str, ids: &[u64]) -> PakArchive {
    let mut builder = PakBuilder::new();
    for &id in ids {
        builder.add_entry(TXTR, UniqueId64::new(id), format!("texture {id}").as_bytes());
    }
    PakArchive::open(name, Box::new(MemorySource::new(builder.finish()))).unwrap()
}

/// One level, one area with two explicit layers. 0x501 belongs to the first
/// explicit layer only; 0x500 belongs to the always-active list only.
fn leveled_archive(name: &str) -> PakArchive {
    let mut builder = PakBuilder::new();
    builder.add_entry(STRG, UniqueId64::new(0x100), &strg(&["Chozo Ruins"]));
    builder.add_entry(STRG, UniqueId64::new(0x101), &strg(&["Main Plaza"]));
    builder.add_entry(
        MAPW,
        UniqueId64::new(0x200),
        &WorldMap { area_maps: vec![] }.to_bytes().unwrap(),
    );
    builder.add_entry(
        AREA,
        UniqueId64::new(0x401),
        &AreaPayload {
            layer_deps: vec![vec![UniqueId64::new(0x500)], vec![UniqueId64::new(0x501)]],
        }
        .to_bytes()
        .unwrap(),
    );
    builder.add_entry(TXTR, UniqueId64::new(0x500), b"plaza floor");
    builder.add_entry(TXTR, UniqueId64::new(0x501), b"plaza door");

    let manifest = LevelManifest {
        world_name_id: UniqueId64::new(0x100),
        world_map_id: UniqueId64::new(0x200),
        areas: vec![AreaRef {
            area_name_id: UniqueId64::new(0x101),
            area_id: UniqueId64::new(0x401),
            internal_name: "plaza".into(),
        }],
        layer_flags: vec![LayerFlags {
            layer_count: 3,
            flags: 0b11,
        }],
        layer_names: vec!["Enemies".into(), "Cinematics".into()],
    };
    builder.add_entry(MLVL, UniqueId64::new(0x300), &manifest.to_bytes().unwrap());

    PakArchive::open(name, Box::new(MemorySource::new(builder.finish()))).unwrap()
}

fn router_in(root: &Path) -> ResourceRouter {
    ResourceRouter::new(
        ProjectPath::new(root.join("working")),
        ProjectPath::new(root.join("cooked")),
    )
}

#[test]
fn test_two_archive_partition_and_path_placement() {
    let tmp = tempfile::tempdir().unwrap();
    let mut archives = vec![
        flat_archive("Metroid1.pak", &[0x10, 0x20]),
        flat_archive("Metroid2.pak", &[0x20, 0x30]),
    ];
    let mut router = router_in(tmp.path());
    router.build(&mut archives, &mut |_| {}).unwrap();

    assert_eq!(router.unique_count(), 2);
    assert_eq!(router.shared_count(), 1);
    assert!(router.is_shared(UniqueId64::new(0x20)));

    router.enter_archive(&archives[0]).unwrap();
    let registry = ExtractorRegistry::with_defaults();

    let unique = archives[0]
        .pak()
        .lookup_entry(UniqueId64::new(0x10))
        .unwrap();
    let path = router
        .working_path(&archives[0], unique, &registry.get(unique.kind))
        .unwrap();
    // .pak suffix stripped from the per-archive subtree name
    assert!(path.as_path().starts_with(tmp.path().join("working/Metroid1")));

    let shared = archives[0]
        .pak()
        .lookup_entry(UniqueId64::new(0x20))
        .unwrap();
    let path = router
        .working_path(&archives[0], shared, &registry.get(shared.kind))
        .unwrap();
    assert!(path.as_path().starts_with(tmp.path().join("working/Shared")));

    let cooked = router.cooked_path(&archives[0], shared).unwrap();
    assert!(cooked.as_path().starts_with(tmp.path().join("cooked/Shared")));
}

#[test]
fn test_shared_paths_agree_across_archive_contexts() {
    let tmp = tempfile::tempdir().unwrap();
    let mut archives = vec![
        flat_archive("Metroid1.pak", &[0x10, 0x20]),
        flat_archive("Metroid2.pak", &[0x20, 0x30]),
    ];
    let mut router = router_in(tmp.path());
    router.build(&mut archives, &mut |_| {}).unwrap();

    router.enter_archive(&archives[0]).unwrap();
    let entry_a = archives[0]
        .pak()
        .lookup_entry(UniqueId64::new(0x20))
        .unwrap()
        .clone();
    let from_a = router.cooked_path(&archives[0], &entry_a).unwrap();

    router.enter_archive(&archives[1]).unwrap();
    let entry_b = archives[1]
        .pak()
        .lookup_entry(UniqueId64::new(0x20))
        .unwrap()
        .clone();
    let from_b = router.cooked_path(&archives[1], &entry_b).unwrap();

    assert_eq!(from_a, from_b);
}

#[test]
fn test_dependency_tree_routes_unique_entries_by_depth() {
    let tmp = tempfile::tempdir().unwrap();
    let mut archives = vec![leveled_archive("Ruins.pak")];
    let mut router = router_in(tmp.path());
    router.build(&mut archives, &mut |_| {}).unwrap();
    router.enter_archive(&archives[0]).unwrap();
    let registry = ExtractorRegistry::with_defaults();

    // Always-active dependency: area directory
    let floor = archives[0]
        .pak()
        .lookup_entry(UniqueId64::new(0x500))
        .unwrap();
    let path = router
        .working_path(&archives[0], floor, &registry.get(floor.kind))
        .unwrap();
    assert_eq!(
        path.as_path(),
        tmp.path()
            .join("working/Ruins/00 Main Plaza/TXTR_0000000000000500")
    );

    // Single explicit layer: layer directory
    let door = archives[0]
        .pak()
        .lookup_entry(UniqueId64::new(0x501))
        .unwrap();
    let path = router
        .working_path(&archives[0], door, &registry.get(door.kind))
        .unwrap();
    assert_eq!(
        path.as_path(),
        tmp.path()
            .join("working/Ruins/00 Main Plaza/00 Enemies/TXTR_0000000000000501")
    );

    // The manifest itself is claimed by no area: archive root, with the
    // extractor's extension
    let manifest = archives[0]
        .pak()
        .lookup_entry(UniqueId64::new(0x300))
        .unwrap();
    let path = router
        .working_path(&archives[0], manifest, &registry.get(manifest.kind))
        .unwrap();
    assert_eq!(
        path.as_path(),
        tmp.path().join("working/Ruins/MLVL_0000000000000300.json")
    );
}

#[test]
fn test_rebuild_after_archive_set_change_drops_stale_state() {
    let tmp = tempfile::tempdir().unwrap();
    let mut router = router_in(tmp.path());

    let mut archives = vec![
        flat_archive("Metroid1.pak", &[0x10, 0x20]),
        flat_archive("Metroid2.pak", &[0x20]),
    ];
    router.build(&mut archives, &mut |_| {}).unwrap();
    assert!(router.is_shared(UniqueId64::new(0x20)));

    // Drop the second archive; 0x20 must come back as unique
    let mut archives = vec![flat_archive("Metroid1.pak", &[0x10, 0x20])];
    router.build(&mut archives, &mut |_| {}).unwrap();
    assert!(router.is_unique(UniqueId64::new(0x20)));
    assert_eq!(router.shared_count(), 0);
}

#[test]
fn test_build_reports_progress_per_archive() {
    let tmp = tempfile::tempdir().unwrap();
    let mut archives = vec![
        flat_archive("Metroid1.pak", &[0x10]),
        flat_archive("Metroid2.pak", &[0x20]),
        flat_archive("Metroid3.pak", &[0x30]),
    ];
    let mut router = router_in(tmp.path());

    let mut reported = Vec::new();
    router
        .build(&mut archives, &mut |f| reported.push(f))
        .unwrap();
    assert_eq!(reported.len(), 3);
    assert!((reported[2] - 1.0).abs() < f32::EPSILON);
    assert!(reported.windows(2).all(|w| w[0] <= w[1]));
}
