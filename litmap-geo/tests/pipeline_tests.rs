//! End-to-end annotation: authors CSV → cache → annotated CSV → split/audit

mod helpers;

use helpers::{candidate, flagger, lisbon, toledos, FlakyStore, ScriptedProvider};
use litmap_geo::dataset::{
    split_clean, write_annotated, AuthorColumns, AuthorTable, GeocodingAudit,
};
use litmap_geo::services::{annotate_authors, CsvCacheStore, MemoryCacheStore};
use litmap_geo::{CityRole, Resolver};
use std::collections::HashSet;
use tempfile::TempDir;

const AUTHORS: &str = "\
name,borncity,deathcity,activecity,birthyear,deathyear
Camões,Lisbon,,,1524,1580
Vieira,Lisbon,,,1608,1697
Nemo,Unknownsville,,,1500,1570
";

fn authors(csv: &str) -> AuthorTable {
    AuthorTable::from_reader(csv.as_bytes(), &AuthorColumns::default()).unwrap()
}

#[tokio::test]
async fn test_two_lisbons_and_an_unknown_town() {
    let table = authors(AUTHORS);
    let provider = ScriptedProvider::new().with("Lisbon", vec![lisbon()]);
    let calls = provider.calls();
    let mut resolver = Resolver::open(Box::new(provider), flagger(), MemoryCacheStore::new(), 1).unwrap();

    let (annotated, stats) = annotate_authors(&mut resolver, &table.records, 60).await.unwrap();

    let ids: Vec<&str> = annotated
        .iter()
        .map(|a| a.output(CityRole::Born).city_id.as_str())
        .filter(|id| !id.is_empty())
        .collect();
    assert_eq!(ids, vec!["1", "1"]);
    let distinct: HashSet<&str> = ids.into_iter().collect();
    assert_eq!(distinct.len(), 1);

    let unknown = annotated[2].output(CityRole::Born);
    assert_eq!(unknown.coordinates, "");
    assert_eq!(unknown.country, "");
    assert_eq!(unknown.city_id, "");
    assert_eq!(unknown.before_discovery, "");

    let lisbon_out = annotated[0].output(CityRole::Born);
    assert_eq!(lisbon_out.coordinates, "38.7222524, -9.1393366");
    assert_eq!(lisbon_out.country, "Portugal");
    assert_eq!(lisbon_out.before_discovery, "no");

    assert_eq!(stats.rows, 3);
    assert_eq!(stats.roles_seen, 3);
    assert_eq!(stats.resolved, 1);
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(stats.unresolved, 1);
    assert_eq!(calls.lock().unwrap().len(), 2);

    let (clean, bad) = split_clean(&annotated);
    assert_eq!(clean.len(), 2);
    assert_eq!(bad.len(), 1);
    assert_eq!(bad[0].record.born.as_deref(), Some("Unknownsville"));

    let audit = GeocodingAudit::from_annotated(&annotated);
    assert_eq!(audit.geocoded_places, 1);
    assert_eq!(audit.ungeocoded_names, 1);
    assert!((audit.ungeocoded_percentage - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_role_years_drive_disambiguation_and_flags() {
    let csv = "\
name,borncity,deathcity,activecity,birthyear,deathyear
Early,Toledo,Salvador,,1380,1440
Late,Toledo,Salvador,,1840,1900
Undated,Toledo,,,,
";
    let table = authors(csv);
    let provider = ScriptedProvider::new()
        .with("Toledo", toledos())
        .with("Salvador", vec![candidate("Salvador", -12.97, -38.50, "Brazil", None)]);
    let mut resolver = Resolver::open(Box::new(provider), flagger(), MemoryCacheStore::new(), 1).unwrap();

    let (annotated, stats) = annotate_authors(&mut resolver, &table.records, 60).await.unwrap();

    assert_eq!(annotated[0].reference_year, Some(1440));
    assert_eq!(annotated[0].output(CityRole::Born).country, "Spain");
    assert_eq!(annotated[0].output(CityRole::Death).before_discovery, "yes");
    assert_eq!(annotated[1].output(CityRole::Born).country, "United States");
    assert_eq!(annotated[1].output(CityRole::Death).before_discovery, "no");

    // no reference year: left unresolved, never sent to the provider
    assert_eq!(annotated[2].reference_year, None);
    assert!(!annotated[2].output(CityRole::Born).is_geocoded());

    assert_eq!(stats.flagged, 1);
    assert_eq!(stats.unresolved, 1);

    let (clean, bad) = split_clean(&annotated);
    let clean_names: Vec<&str> = clean.iter().map(|a| a.record.fields[0].as_str()).collect();
    let bad_names: Vec<&str> = bad.iter().map(|a| a.record.fields[0].as_str()).collect();
    assert_eq!(clean_names, vec!["Late"]);
    assert_eq!(bad_names, vec!["Early", "Undated"]);
}

#[tokio::test]
async fn test_provider_errors_do_not_stop_the_run() {
    let csv = "\
name,borncity,deathcity,activecity,birthyear,deathyear
A,Flaky,Lisbon,,1500,1560
";
    let table = authors(csv);
    let provider = ScriptedProvider::new()
        .with("Lisbon", vec![lisbon()])
        .failing("Flaky");
    let mut resolver = Resolver::open(Box::new(provider), flagger(), MemoryCacheStore::new(), 1).unwrap();

    let (annotated, stats) = annotate_authors(&mut resolver, &table.records, 60).await.unwrap();

    assert_eq!(stats.provider_errors, 1);
    assert_eq!(stats.unresolved, 1);
    assert_eq!(stats.resolved, 1);
    assert!(annotated[0].output(CityRole::Death).is_geocoded());
    assert!(!annotated[0].output(CityRole::Born).is_geocoded());
}

#[tokio::test]
async fn test_final_flush_failure_fails_the_run() {
    let table = authors(AUTHORS);
    let store = FlakyStore::new();
    let provider = ScriptedProvider::new().with("Lisbon", vec![lisbon()]);
    let mut resolver = Resolver::open(Box::new(provider), flagger(), store.clone(), 1).unwrap();

    // the in-run append and the final flush both fail
    store.fail_next(2);
    let result = annotate_authors(&mut resolver, &table.records, 60).await;
    assert!(result.is_err());
    assert_eq!(resolver.cache().pending().len(), 1);

    // recovered store: pending rows go out on the next flush
    assert_eq!(resolver.flush().unwrap(), 1);
    assert_eq!(store.rows().len(), 1);
}

#[tokio::test]
async fn test_rerun_reproduces_output_from_cache() {
    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("geocode_cache.csv");
    let first_out = dir.path().join("first.csv");
    let second_out = dir.path().join("second.csv");
    let table = authors(AUTHORS);

    {
        let provider = ScriptedProvider::new().with("Lisbon", vec![lisbon()]);
        let mut resolver =
            Resolver::open(Box::new(provider), flagger(), CsvCacheStore::new(&cache_path), 1).unwrap();
        let (annotated, _) = annotate_authors(&mut resolver, &table.records, 60).await.unwrap();
        write_annotated(&first_out, &table, &annotated).unwrap();
    }

    {
        // second run has no provider answers at all
        let provider = ScriptedProvider::new();
        let calls = provider.calls();
        let mut resolver =
            Resolver::open(Box::new(provider), flagger(), CsvCacheStore::new(&cache_path), 1).unwrap();
        let (annotated, stats) = annotate_authors(&mut resolver, &table.records, 60).await.unwrap();
        write_annotated(&second_out, &table, &annotated).unwrap();

        assert_eq!(stats.cache_hits, 2);
        assert_eq!(calls.lock().unwrap().as_slice(), ["Unknownsville".to_string()]);
    }

    let first = std::fs::read_to_string(&first_out).unwrap();
    let second = std::fs::read_to_string(&second_out).unwrap();
    assert_eq!(first, second);

    let header = first.lines().next().unwrap();
    assert!(header.starts_with("name,borncity,deathcity,activecity,birthyear,deathyear,year_map,borncity_coordinates"));

    let audit = GeocodingAudit::from_csv(&second_out, &AuthorColumns::default()).unwrap();
    assert_eq!(audit.geocoded_places, 1);
    assert_eq!(audit.ungeocoded_names, 1);
}
