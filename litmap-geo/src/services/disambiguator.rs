//! Candidate disambiguation
//!
//! Picks one place among several sharing a name, conditioned on the
//! reference year. Candidates are bucketed into Europe, Americas-or-Oceania
//! and other. When some Americas/Oceania candidate would be anachronistic
//! for the year, the preference order is:
//!
//! 1. a Europe candidate
//! 2. any other non-Americas/Oceania candidate
//! 3. last resort: an Americas/Oceania candidate, plausible ones first
//!
//! Otherwise the first candidate wins. Within a bucket the largest
//! population wins when every member has one, else first-seen order. The
//! same rules run on fresh provider results and on cached records, which
//! carry no population and are stored in provider order.

use super::flagger::Flagger;
use crate::regions::Region;
use crate::types::{Candidate, ResolvedLocation};

/// Anything the disambiguator can rank
pub trait Locatable {
    fn country(&self) -> Option<&str>;

    fn population(&self) -> Option<u64> {
        None
    }
}

impl Locatable for Candidate {
    fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    fn population(&self) -> Option<u64> {
        self.population
    }
}

impl Locatable for ResolvedLocation {
    fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }
}

/// Which rule produced the winner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    /// Single candidate
    Only,
    /// No era conflict: first (or most populous) candidate
    First,
    /// Era conflict resolved to Europe
    Europe,
    /// Era conflict resolved outside Europe and Americas/Oceania
    Other,
    /// Era conflict with no alternative; Americas/Oceania kept
    LastResort,
}

/// Winning candidate index and the rule that chose it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub index: usize,
    pub preference: Preference,
}

/// Choose one candidate for `reference_year`; `None` for an empty slice
pub fn disambiguate<T: Locatable>(
    candidates: &[T],
    reference_year: i32,
    flagger: &Flagger,
) -> Option<Selection> {
    match candidates.len() {
        0 => return None,
        1 => {
            return Some(Selection {
                index: 0,
                preference: Preference::Only,
            })
        }
        _ => {}
    }

    let regions = flagger.regions();
    let mut europe = Vec::new();
    let mut americas_oceania = Vec::new();
    let mut other = Vec::new();

    for (i, candidate) in candidates.iter().enumerate() {
        match regions.region(candidate.country()) {
            Region::Europe => europe.push(i),
            Region::AmericasOrOceania => americas_oceania.push(i),
            Region::Other => other.push(i),
        }
    }

    let (anachronistic, plausible): (Vec<usize>, Vec<usize>) = americas_oceania
        .iter()
        .partition(|&&i| flagger.is_anachronistic(candidates[i].country(), reference_year));

    if anachronistic.is_empty() {
        let all: Vec<usize> = (0..candidates.len()).collect();
        return best_of(candidates, &all).map(|index| Selection {
            index,
            preference: Preference::First,
        });
    }

    if let Some(index) = best_of(candidates, &europe) {
        return Some(Selection {
            index,
            preference: Preference::Europe,
        });
    }

    if let Some(index) = best_of(candidates, &other) {
        return Some(Selection {
            index,
            preference: Preference::Other,
        });
    }

    best_of(candidates, &plausible)
        .or_else(|| best_of(candidates, &anachronistic))
        .map(|index| Selection {
            index,
            preference: Preference::LastResort,
        })
}

/// Largest population when all members report one, else first-seen
fn best_of<T: Locatable>(candidates: &[T], bucket: &[usize]) -> Option<usize> {
    let first = *bucket.first()?;

    if bucket.iter().any(|&i| candidates[i].population().is_none()) {
        return Some(first);
    }

    let mut best = first;
    for &i in &bucket[1..] {
        if candidates[i].population() > candidates[best].population() {
            best = i;
        }
    }
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions::RegionTable;
    use crate::types::Coordinates;
    use litmap_common::CountryField;

    fn flagger() -> Flagger {
        Flagger::new(RegionTable::new(CountryField::Name))
    }

    fn cand(country: &str, population: Option<u64>) -> Candidate {
        Candidate {
            name: "X".to_string(),
            coordinates: Coordinates::new(0.0, 0.0),
            country: Some(country.to_string()),
            population,
        }
    }

    #[test]
    fn test_empty_and_single() {
        let f = flagger();
        assert_eq!(disambiguate::<Candidate>(&[], 1400, &f), None);
        let one = [cand("Brazil", None)];
        assert_eq!(
            disambiguate(&one, 1400, &f),
            Some(Selection {
                index: 0,
                preference: Preference::Only
            })
        );
    }

    #[test]
    fn test_europe_preferred_before_discovery() {
        let candidates = [cand("Brazil", Some(1000)), cand("Portugal", Some(500))];
        let pick = disambiguate(&candidates, 1400, &flagger()).unwrap();
        assert_eq!(pick.index, 1);
        assert_eq!(pick.preference, Preference::Europe);
    }

    #[test]
    fn test_other_bucket_when_no_europe() {
        let candidates = [cand("Brazil", None), cand("Japan", None)];
        let pick = disambiguate(&candidates, 1400, &flagger()).unwrap();
        assert_eq!(pick.index, 1);
        assert_eq!(pick.preference, Preference::Other);
    }

    #[test]
    fn test_last_resort_keeps_americas() {
        let candidates = [cand("Brazil", None), cand("Mexico", None)];
        let pick = disambiguate(&candidates, 1400, &flagger()).unwrap();
        assert_eq!(pick.index, 0);
        assert_eq!(pick.preference, Preference::LastResort);
    }

    #[test]
    fn test_last_resort_prefers_plausible_member() {
        // 1550: United States (1492) is plausible, Australia (1606) is not
        let candidates = [cand("Australia", None), cand("United States", None)];
        let pick = disambiguate(&candidates, 1550, &flagger()).unwrap();
        assert_eq!(pick.index, 1);
        assert_eq!(pick.preference, Preference::LastResort);
    }

    #[test]
    fn test_first_candidate_after_discovery() {
        let candidates = [cand("Brazil", None), cand("Portugal", None)];
        let pick = disambiguate(&candidates, 1500, &flagger()).unwrap();
        assert_eq!(pick.index, 0);
        assert_eq!(pick.preference, Preference::First);
    }

    #[test]
    fn test_largest_population_after_discovery() {
        let candidates = [cand("United States", Some(9500)), cand("Portugal", Some(517802))];
        let pick = disambiguate(&candidates, 1900, &flagger()).unwrap();
        assert_eq!(pick.index, 1);
        assert_eq!(pick.preference, Preference::First);
    }

    #[test]
    fn test_europe_ties_broken_by_population() {
        let candidates = [
            cand("Brazil", Some(1)),
            cand("Spain", Some(10)),
            cand("France", Some(20)),
            cand("Italy", Some(20)),
        ];
        let pick = disambiguate(&candidates, 1200, &flagger()).unwrap();
        // France and Italy tie; first-seen wins
        assert_eq!(pick.index, 2);
    }

    #[test]
    fn test_missing_population_falls_back_to_order() {
        let candidates = [cand("Brazil", None), cand("Spain", None), cand("France", Some(99))];
        let pick = disambiguate(&candidates, 1200, &flagger()).unwrap();
        assert_eq!(pick.index, 1);
    }

    #[test]
    fn test_no_americas_candidate_takes_first() {
        let candidates = [cand("Japan", None), cand("Portugal", None)];
        let pick = disambiguate(&candidates, 800, &flagger()).unwrap();
        assert_eq!(pick.index, 0);
        assert_eq!(pick.preference, Preference::First);
    }

    #[test]
    fn test_cached_records_rank_without_population() {
        let cached = vec![
            ResolvedLocation {
                city_name: "Toledo".to_string(),
                coordinates: Coordinates::new(41.65, -83.53),
                country: Some("United States".to_string()),
                location_id: crate::types::LocationId(1),
            },
            ResolvedLocation {
                city_name: "Toledo".to_string(),
                coordinates: Coordinates::new(39.86, -4.02),
                country: Some("Spain".to_string()),
                location_id: crate::types::LocationId(2),
            },
        ];
        let f = flagger();
        assert_eq!(disambiguate(&cached, 1450, &f).unwrap().index, 1);
        assert_eq!(disambiguate(&cached, 1850, &f).unwrap().index, 0);
    }
}
