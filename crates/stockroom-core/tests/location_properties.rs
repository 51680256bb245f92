//! Catalog and path invariants checked over the whole built-in tree

use rstest::rstest;
use stockroom_core::{LocationCatalog, LocationLevel, LocationPath};

fn every_path(catalog: &LocationCatalog) -> Vec<LocationPath> {
    let mut paths = Vec::new();
    for main in catalog.main_options() {
        paths.push(LocationPath::main_only(&main.id));
        for sub in &main.children {
            paths.push(LocationPath::new(&main.id, &sub.id, ""));
            for fin in &sub.children {
                paths.push(LocationPath::new(&main.id, &sub.id, &fin.id));
            }
        }
    }
    paths
}

#[test]
fn test_every_catalog_path_validates() {
    let catalog = LocationCatalog::builtin();
    let paths = every_path(&catalog);
    assert!(paths.len() > 40);
    for path in &paths {
        assert!(catalog.validate(path).is_ok(), "{} should be valid", path);
    }
}

#[test]
fn test_selecting_main_clears_lower_levels_everywhere() {
    let catalog = LocationCatalog::builtin();
    for mut path in every_path(&catalog) {
        path.select(LocationLevel::Main, "storage");
        assert_eq!(path.sub, "");
        assert_eq!(path.final_, "");
    }
}

#[test]
fn test_selecting_sub_clears_final_everywhere() {
    let catalog = LocationCatalog::builtin();
    for mut path in every_path(&catalog) {
        path.select(LocationLevel::Sub, "red");
        assert_eq!(path.final_, "");
    }
}

#[rstest]
#[case(LocationPath::new("sales", "green", "x"))]
#[case(LocationPath::new("storage", "ss", "a"))]
#[case(LocationPath::new("preparation", "ins", "1"))]
#[case(LocationPath::new("sales", "", "red-a"))]
#[case(LocationPath::new("pharmacy", "", ""))]
#[case(LocationPath::default())]
fn test_invalid_paths_rejected(#[case] path: LocationPath) {
    assert!(LocationCatalog::builtin().validate(&path).is_err());
}

#[test]
fn test_catalog_json_round_trip_keeps_tree() {
    let catalog = LocationCatalog::builtin();
    let parsed = LocationCatalog::from_json(&catalog.to_json().unwrap()).unwrap();
    assert_eq!(parsed.format_tree(), catalog.format_tree());
}
