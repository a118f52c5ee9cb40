//! Persistence adapter tests: load/save through the filesystem and streams,
//! plus reading a world save the way a game would.

use celljson::file::{from_reader, load, load_with, save, to_writer};
use celljson::{parse, JsonError, Kind, Object, ParseOptions, Value};

fn world_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/world.json")
}

/// Typed view of one player record.
#[derive(Debug, PartialEq)]
struct Player {
    alliance: i64,
    gold: i64,
    food: i64,
    wood: i64,
    iron: i64,
    stone: i64,
}

fn read_player(value: &Value) -> celljson::Result<Player> {
    let obj = value.require_object()?;
    Ok(Player {
        alliance: obj.i64_field("alliance")?,
        gold: obj.i64_field("gold")?,
        food: obj.i64_field("food")?,
        wood: obj.i64_field("wood")?,
        iron: obj.i64_field("iron")?,
        stone: obj.i64_field("stone")?,
    })
}

/// `(name, count, owner)` troop triples.
fn read_troops(region: &Object) -> celljson::Result<Vec<(String, i64, i64)>> {
    let Some(troops) = region.get("troops") else {
        return Ok(Vec::new());
    };
    troops
        .require_array()?
        .iter()
        .map(|t| -> celljson::Result<(String, i64, i64)> {
            let t = t.require_array()?;
            let name = t[0].require_str()?.to_string();
            Ok((name, t[1].require_i64()?, t[2].require_i64()?))
        })
        .collect()
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn load_world_fixture() {
    let world = load(world_path()).unwrap();
    let root = world.require_object().unwrap();

    let players = root.array_field("players").unwrap();
    assert_eq!(players.len(), 3);
    assert_eq!(
        read_player(&players[0]).unwrap(),
        Player {
            alliance: 0,
            gold: 120,
            food: 40,
            wood: 35,
            iron: 0,
            stone: 10
        }
    );

    let regions = root.object_field("regions").unwrap();
    assert_eq!(regions.len(), 3);

    let riverside = regions.object_field("Riverside").unwrap();
    assert_eq!(riverside.i64_field("owner").unwrap(), 0);
    assert_eq!(
        read_troops(riverside).unwrap(),
        vec![("Peasant".to_string(), 12, 0), ("Swordsman".to_string(), 3, 0)]
    );
    let garrison = riverside.object_field("garrison").unwrap();
    assert_eq!(read_troops(garrison).unwrap().len(), 1);
    assert_eq!(riverside.str_field("construct").unwrap(), "Sawmill");

    let location = riverside.array_field("location").unwrap();
    assert_eq!(location.len(), 4);
    assert_eq!(location[2].at(1).unwrap().require_f64().unwrap(), 40.25);

    let hilltop = regions.object_field("Hilltop").unwrap();
    assert!(hilltop.get("garrison").is_none());
    assert!(read_troops(hilltop).unwrap().is_empty());
    assert_eq!(hilltop.array_field("center").unwrap()[0].kind(), Kind::Real);
}

#[test]
fn wrong_field_type_is_the_callers_error() {
    let world = parse(br#"{"owner": "nobody"}"#).unwrap();
    let err = world.as_object().unwrap().i64_field("owner").unwrap_err();
    assert!(matches!(err, JsonError::UnexpectedType { .. }));
}

#[test]
fn load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load(dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, JsonError::Io(_)));
}

#[test]
fn load_malformed_file_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, b"{\"players\": [1, 2,]}").unwrap();
    assert!(matches!(load(&path), Err(JsonError::Malformed { .. })));
}

#[test]
fn load_with_respects_depth_bound() {
    // Riverside's garrison troops sit 6 containers deep.
    assert!(load_with(world_path(), ParseOptions::default().with_max_depth(6)).is_ok());
    assert!(matches!(
        load_with(world_path(), ParseOptions::default().with_max_depth(5)),
        Err(JsonError::DepthExceeded { .. })
    ));
}

// ============================================================================
// Saving
// ============================================================================

#[test]
fn save_then_load_roundtrips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("world.json");

    let world = load(world_path()).unwrap();
    save(&path, &world).unwrap();
    let reloaded = load(&path).unwrap();
    assert_eq!(reloaded, world);

    let on_disk = std::fs::read(&path).unwrap();
    assert_eq!(on_disk.len(), celljson::size(&world));
    assert_eq!(dir_entries(dir.path()), ["world.json"]);
}

#[test]
fn save_replaces_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("save.json");
    std::fs::write(&path, b"old contents that are longer than the new ones").unwrap();

    save(&path, &Value::from("new")).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), br#""new""#);
}

#[test]
fn save_built_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("built.json");

    let mut player = Value::object().unwrap();
    for (field, amount) in [("alliance", 0), ("gold", 10)] {
        player.object_insert(field, Value::integer(amount)).unwrap();
    }
    let mut players = Value::array();
    players.array_insert(player).unwrap();
    let mut root = Value::object().unwrap();
    root.object_insert("players", players).unwrap();

    save(&path, &root).unwrap();
    let back = load(&path).unwrap();
    let first = back.get("players").and_then(|p| p.at(0)).unwrap();
    assert_eq!(first.get("gold"), Some(&Value::Integer(10)));
}

/// Names of every entry in `dir`, sorted.
fn dir_entries(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn failed_save_leaves_no_temporary_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("x.json");
    // A directory in the way makes the final rename fail.
    std::fs::create_dir(&path).unwrap();

    let err = save(&path, &Value::Null).unwrap_err();
    assert!(matches!(err, JsonError::Io(_)));
    assert_eq!(dir_entries(dir.path()), ["x.json"]);
    assert!(path.is_dir());
}

#[test]
fn save_into_missing_directory_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-such-dir").join("world.json");
    assert!(matches!(save(&path, &Value::Null), Err(JsonError::Io(_))));
    assert!(dir_entries(dir.path()).is_empty());
}

#[test]
fn successful_save_leaves_only_the_target() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("world.json");
    save(&path, &Value::integer(1)).unwrap();
    save(&path, &Value::integer(2)).unwrap();
    assert_eq!(dir_entries(dir.path()), ["world.json"]);
    assert_eq!(std::fs::read(&path).unwrap(), b"2");
}

// ============================================================================
// Streams
// ============================================================================

#[test]
fn stream_roundtrip() {
    let doc = parse(br#"{"regions":{"Marsh":{"owner":2}}}"#).unwrap();
    let mut out = Vec::new();
    let written = to_writer(&mut out, &doc).unwrap();
    assert_eq!(written, out.len());
    assert_eq!(out, br#"{"regions":{"Marsh":{"owner":2}}}"#);

    let back = from_reader(out.as_slice(), ParseOptions::default()).unwrap();
    assert_eq!(back, doc);
}
