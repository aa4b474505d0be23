use std::fs;

use stagectl_io::{DirectoryLoader, LoadError};

const DEVICES_YAML: &str = r#"
dmxDeviceTypes:
  - id: rgb
    leds:
      - position: 0
        red: 0
        green: 1
        blue: 2
dmxDevices:
  - id: par1
    typeId: rgb
    universe: 0
    startChannel: 0
"#;

const SONG_JSON: &str = r#"{
  "songs": [
    {
      "id": "opener",
      "name": "Opener v1",
      "barChanges": [{ "at": 0, "noteValue": 4, "noteCount": 4, "speed": 120 }]
    }
  ],
  "setLists": [
    { "id": "main", "name": "Main", "songs": [{ "id": "opener" }] }
  ]
}"#;

const SONG_OVERRIDE_YAML: &str = r#"
songs:
  - id: opener
    name: Opener v2
    barChanges:
      - { at: 0, noteValue: 4, noteCount: 3, speed: 90 }
"#;

#[test]
fn test_loads_nested_directories() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("devices")).unwrap();
    fs::write(dir.path().join("devices/fixtures.yml"), DEVICES_YAML).unwrap();
    fs::write(dir.path().join("a_songs.json"), SONG_JSON).unwrap();

    let store = DirectoryLoader::new(dir.path()).load().unwrap();
    assert!(store.device("par1").is_some());
    assert!(store.device_type("rgb").is_some());
    assert_eq!(store.song("opener").unwrap().name, "Opener v1");
    assert_eq!(store.set_list("main").unwrap().songs[0].id, "opener");
}

#[test]
fn test_later_files_override_earlier() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a_songs.json"), SONG_JSON).unwrap();
    fs::write(dir.path().join("b_songs.yaml"), SONG_OVERRIDE_YAML).unwrap();

    let store = DirectoryLoader::new(dir.path()).load().unwrap();
    let song = store.song("opener").unwrap();
    assert_eq!(song.name, "Opener v2");
    assert_eq!(song.bar_changes[0].note_count, 3);
    // untouched collections survive the merge
    assert!(store.set_list("main").is_some());
}

#[test]
fn test_unknown_extension_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("songs.json"), SONG_JSON).unwrap();
    fs::write(dir.path().join("readme.md"), "# notes").unwrap();

    let err = DirectoryLoader::new(dir.path()).load().unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedFormat { ref extension, .. } if extension == "md"));
}

#[test]
fn test_hidden_entries_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join(".git")).unwrap();
    fs::write(dir.path().join(".git/HEAD"), "ref: refs/heads/main").unwrap();
    fs::write(dir.path().join(".DS_Store"), [0u8; 4]).unwrap();
    fs::write(dir.path().join("songs.json"), SONG_JSON).unwrap();

    let store = DirectoryLoader::new(dir.path()).load().unwrap();
    assert_eq!(store.songs.len(), 1);
}

#[test]
fn test_parse_error_names_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.yml"), "songs: [ {").unwrap();

    let err = DirectoryLoader::new(dir.path()).load().unwrap_err();
    assert!(matches!(err, LoadError::Yaml { .. }));
    assert!(err.to_string().contains("broken.yml"));
}

#[test]
fn test_file_size_limit() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("songs.json"), SONG_JSON).unwrap();

    let err = DirectoryLoader::new(dir.path())
        .with_max_file_size(8)
        .load()
        .unwrap_err();
    assert!(matches!(err, LoadError::FileTooLarge { limit: 8, .. }));
}

#[test]
fn test_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nowhere");
    assert!(matches!(
        DirectoryLoader::new(&missing).load(),
        Err(LoadError::DirectoryNotFound(_))
    ));
}
