//! Offline gazetteer loaded from disk and driven through the resolver

mod helpers;

use helpers::flagger;
use litmap_common::CountryField;
use litmap_geo::providers::{Gazetteer, GazetteerOptions};
use litmap_geo::services::MemoryCacheStore;
use litmap_geo::{AnachronismFlag, GazetteerError, LocationId, Resolver};
use std::fs;
use tempfile::TempDir;

const EXPORT: &str = "\
Geoname ID;Name;ASCII Name;Alternate Names;Feature Class;Country Code;Country;Population;Coordinates
4160021;Lisbon;Lisbon;;P;US;United States;9500;28.87193, -81.78675
2267057;Lisbon;Lisbon;Lisboa;P;PT;Portugal;517802;38.71667, -9.13333
3451190;Rio de Janeiro;Rio de Janeiro;;P;BR;Brazil;6023699;-22.90642, -43.18223
";

fn write_export(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("geonames-all-cities-with-a-population-500.csv");
    fs::write(&path, EXPORT).unwrap();
    path
}

#[tokio::test]
async fn test_largest_population_wins_without_era_conflict() {
    let dir = TempDir::new().unwrap();
    let gazetteer = Gazetteer::load(&write_export(&dir), ';', GazetteerOptions::default()).unwrap();
    let mut resolver = Resolver::open(Box::new(gazetteer), flagger(), MemoryCacheStore::new(), 1).unwrap();

    let lisbon = resolver.resolve("Lisbon", 1900).await.unwrap();
    assert_eq!(lisbon.location.country.as_deref(), Some("Portugal"));
    // both places cached, the larger one first
    assert_eq!(lisbon.location.location_id, LocationId(1));
    assert_eq!(resolver.cache().get("Lisbon").unwrap().len(), 2);
}

#[tokio::test]
async fn test_code_representation_end_to_end() {
    let dir = TempDir::new().unwrap();
    let options = GazetteerOptions {
        case_insensitive: true,
        country_field: CountryField::Code,
    };
    let gazetteer = Gazetteer::load(&write_export(&dir), ';', options).unwrap();
    let flagger = litmap_geo::Flagger::new(litmap_geo::RegionTable::new(CountryField::Code));
    let mut resolver = Resolver::open(Box::new(gazetteer), flagger, MemoryCacheStore::new(), 0).unwrap();

    let rio = resolver.resolve("rio de janeiro", 1450).await.unwrap();
    assert_eq!(rio.location.country.as_deref(), Some("BR"));
    assert_eq!(rio.location.location_id, LocationId(0));
    assert_eq!(rio.flag, AnachronismFlag::Yes);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let result = Gazetteer::load(&dir.path().join("absent.csv"), ';', GazetteerOptions::default());
    assert!(matches!(result, Err(GazetteerError::Io(_))));
}
