use std::fs;

use pretty_assertions::assert_eq;
use weft_mappings::{Direction, MappingService, MappingVersion, SrgFileSource};

const SRG: &str = "\
CL: a com/example/Foo
CL: b com/example/Bar
FD: a/c com/example/Foo/count
MD: a/d (Lb;)La; com/example/Foo/with (Lcom/example/Bar;)Lcom/example/Foo;
";

#[test]
fn srg_file_source_loads_lazily_per_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("1.0.srg");
    fs::write(&path, SRG).unwrap();

    let service = MappingService::new(SrgFileSource::new().with_file("1.0", &path));
    let version = MappingVersion::new("1.0");
    assert!(!service.is_cached(&version));

    let table = service.table(&version);
    assert!(service.is_cached(&version));
    assert_eq!(table.class("com/example/Foo", Direction::ToCompiled), Some("a"));
    assert_eq!(
        table.method(
            Some("com/example/Foo"),
            "with",
            Some("(Lcom/example/Bar;)Lcom/example/Foo;"),
            Direction::ToCompiled
        ),
        Some("d")
    );

    // Cached tables survive the file going away.
    fs::remove_file(&path).unwrap();
    assert_eq!(service.table(&version).class_count(), 2);
}

#[test]
fn unreadable_and_malformed_files_degrade_to_identity() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.srg");
    fs::write(&broken, "CL: onlyone\n").unwrap();

    let source = SrgFileSource::new()
        .with_file("missing", dir.path().join("nope.srg"))
        .with_file("broken", &broken);
    let service = MappingService::new(source);

    for version in ["missing", "broken", "never-configured"] {
        let table = service.table(&MappingVersion::new(version));
        assert!(table.is_empty(), "{version} should be identity");
        assert_eq!(table.map_class("com/example/Foo", Direction::ToCompiled), "com/example/Foo");
    }
}

#[test]
fn class_and_descriptor_mapping_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("1.0.srg");
    fs::write(&path, SRG).unwrap();
    let service = MappingService::new(SrgFileSource::new().with_file("1.0", &path));
    let table = service.table(&MappingVersion::new("1.0"));

    let mapped = "(Lcom/example/Bar;[Lcom/example/Foo;)V";
    let compiled = table.map_descriptor(mapped, Direction::ToCompiled);
    assert_eq!(compiled, "(Lb;[La;)V");
    assert_eq!(table.map_descriptor(&compiled, Direction::ToMapped), mapped);
    // Already compiled names pass through untouched.
    assert_eq!(table.map_descriptor(&compiled, Direction::ToCompiled), compiled);
}
