use lingo::{Error, Localization, Variables};
use tempfile::TempDir;

#[test]
fn load_file_reads_utf8_source() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("en-US.lingo");
    std::fs::write(&path, "greet = \"Hello, {name}!\"").unwrap();

    let mut store = Localization::new();
    store.load_file("en-US", &path).unwrap();

    let vars = Variables::new().with("name", "Ada");
    assert_eq!(store.get("greet", &vars).unwrap(), "Hello, Ada!");
}

#[test]
fn load_file_decodes_utf16_with_bom() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fr-FR.lingo");

    let mut bytes = vec![0xFF, 0xFE]; // UTF-16LE BOM
    for unit in "greet = \"Bonjour\"".encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    std::fs::write(&path, &bytes).unwrap();

    let mut store = Localization::new();
    store.load_file("fr-FR", &path).unwrap();
    store.set_current_language("fr-FR").unwrap();

    assert_eq!(store.get("greet", &Variables::new()).unwrap(), "Bonjour");
}

#[test]
fn load_file_missing_path_is_io_error() {
    let dir = TempDir::new().unwrap();
    let mut store = Localization::new();
    let err = store
        .load_file("en-US", dir.path().join("nope.lingo"))
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn loading_two_files_merges_into_one_language() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("base.lingo");
    let extra = dir.path().join("extra.lingo");
    std::fs::write(&base, "a = \"1\"\nb = \"2\"").unwrap();
    std::fs::write(&extra, "b = \"two\"\nc = \"3\"").unwrap();

    let mut store = Localization::new();
    store.load_file("en-US", &base).unwrap();
    store.load_file("en-US", &extra).unwrap();

    let vars = Variables::new();
    assert_eq!(store.get("a", &vars).unwrap(), "1");
    assert_eq!(store.get("b", &vars).unwrap(), "two");
    assert_eq!(store.get("c", &vars).unwrap(), "3");
}

#[test]
fn cache_round_trip_preserves_bundles() {
    let dir = TempDir::new().unwrap();
    let cache = dir.path().join("cache").join("store.json");

    let mut store = Localization::new();
    store.load_str(
        "en-US",
        "@meta { locale = \"en-US\" }\nitems = plural(count) {\none: \"1 item\"\nother: \"{count} items\"\n}",
    );
    store.load_str("ar-EG", "@meta { direction = \"rtl\" }\ngreet = \"مرحبا\"");

    store.cache_to_file(&cache).unwrap();
    let restored = Localization::load_from_cache(&cache).unwrap();

    let vars = Variables::new().with("count", 5);
    assert_eq!(restored.get("items", &vars).unwrap(), "5 items");
    assert_eq!(
        restored.get_in("ar-EG", "greet", &Variables::new()).unwrap(),
        "مرحبا"
    );
    assert!(restored.metadata("ar-EG").unwrap().is_rtl());
}

#[test]
fn keys_covers_each_language_separately() {
    let mut store = Localization::new();
    store.load_str("en-US", "a = \"1\"");
    store.load_str("fr-FR", "b = \"2\"");

    assert_eq!(store.keys(Some("en-US")).collect::<Vec<_>>(), vec!["a"]);
    assert_eq!(store.keys(Some("fr-FR")).collect::<Vec<_>>(), vec!["b"]);
    assert_eq!(store.keys(Some("de-DE")).count(), 0);

    let langs: std::collections::BTreeSet<&str> = store.languages().collect();
    assert!(langs.contains("en-us"));
    assert!(langs.contains("fr-fr"));
}
