//! Anachronism flagging
//!
//! A resolved place is flagged when its country belongs to the
//! Americas-or-Oceania set, a discovery year is on record for it, and the
//! reference year falls before that year. The flag only annotates output;
//! it never changes which place a name resolves to.

use crate::regions::{Region, RegionTable};
use crate::types::AnachronismFlag;

/// Flags locations that are implausible for an era
#[derive(Debug, Clone)]
pub struct Flagger {
    regions: RegionTable,
}

impl Flagger {
    pub fn new(regions: RegionTable) -> Self {
        Self { regions }
    }

    pub fn regions(&self) -> &RegionTable {
        &self.regions
    }

    /// Flag for a resolved country in a reference year.
    ///
    /// `Unknown` only when the country itself is undetermined; a member of
    /// the set without a recorded year is `No`.
    pub fn flag(&self, country: Option<&str>, reference_year: i32) -> AnachronismFlag {
        match country {
            None => AnachronismFlag::Unknown,
            Some(c) if self.is_anachronistic(Some(c), reference_year) => AnachronismFlag::Yes,
            Some(_) => AnachronismFlag::No,
        }
    }

    /// True when `country` predates its region's discovery at `reference_year`
    pub fn is_anachronistic(&self, country: Option<&str>, reference_year: i32) -> bool {
        let Some(country) = country else {
            return false;
        };

        if self.regions.region(Some(country)) != Region::AmericasOrOceania {
            return false;
        }

        self.regions
            .discovery_year(country)
            .map(|year| reference_year < year)
            .unwrap_or(false)
    }
}
