//! Region membership and discovery-year tables
//!
//! Two country sets drive disambiguation and flagging: Europe, and the
//! Americas-or-Oceania set whose members carry the year of first
//! transoceanic contact. Every other country falls in [`Region::Other`].
//!
//! Tables are keyed by the run's [`CountryField`], so a run that extracts
//! ISO codes from its provider looks up "BR" while a run on country names
//! looks up "Brazil".

use litmap_common::CountryField;
use std::collections::HashMap;

/// Coarse region bucket of a country
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Europe,
    AmericasOrOceania,
    Other,
}

/// Static facts about one country
#[derive(Debug, Clone, PartialEq)]
pub struct CountryInfo {
    pub name: &'static str,
    pub code: &'static str,
    /// Other spellings providers return for `name`
    pub aliases: &'static [&'static str],
    pub region: Region,
    pub discovery_year: Option<i32>,
}

const fn europe(name: &'static str, code: &'static str) -> CountryInfo {
    CountryInfo {
        name,
        code,
        aliases: &[],
        region: Region::Europe,
        discovery_year: None,
    }
}

const fn americas_oceania(name: &'static str, code: &'static str, year: i32) -> CountryInfo {
    CountryInfo {
        name,
        code,
        aliases: &[],
        region: Region::AmericasOrOceania,
        discovery_year: Some(year),
    }
}

const fn with_aliases(info: CountryInfo, aliases: &'static [&'static str]) -> CountryInfo {
    CountryInfo { aliases, ..info }
}

/// Built-in country table
pub const COUNTRIES: &[CountryInfo] = &[
    // Europe
    europe("Albania", "AL"),
    europe("Andorra", "AD"),
    europe("Armenia", "AM"),
    europe("Austria", "AT"),
    europe("Azerbaijan", "AZ"),
    europe("Belarus", "BY"),
    europe("Belgium", "BE"),
    europe("Bosnia and Herzegovina", "BA"),
    europe("Bulgaria", "BG"),
    europe("Croatia", "HR"),
    europe("Cyprus", "CY"),
    with_aliases(europe("Czech Republic", "CZ"), &["Czechia"]),
    europe("Denmark", "DK"),
    europe("Estonia", "EE"),
    europe("Finland", "FI"),
    europe("France", "FR"),
    europe("Georgia", "GE"),
    europe("Germany", "DE"),
    europe("Greece", "GR"),
    europe("Hungary", "HU"),
    europe("Iceland", "IS"),
    europe("Ireland", "IE"),
    europe("Italy", "IT"),
    europe("Kazakhstan", "KZ"),
    europe("Kosovo", "XK"),
    europe("Latvia", "LV"),
    europe("Liechtenstein", "LI"),
    europe("Lithuania", "LT"),
    europe("Luxembourg", "LU"),
    europe("Malta", "MT"),
    europe("Moldova", "MD"),
    europe("Monaco", "MC"),
    europe("Montenegro", "ME"),
    europe("Netherlands", "NL"),
    europe("North Macedonia", "MK"),
    europe("Norway", "NO"),
    europe("Poland", "PL"),
    europe("Portugal", "PT"),
    europe("Romania", "RO"),
    europe("Russia", "RU"),
    europe("San Marino", "SM"),
    europe("Serbia", "RS"),
    europe("Slovakia", "SK"),
    europe("Slovenia", "SI"),
    europe("Spain", "ES"),
    europe("Sweden", "SE"),
    europe("Switzerland", "CH"),
    with_aliases(europe("Turkey", "TR"), &["Türkiye"]),
    europe("Ukraine", "UA"),
    europe("United Kingdom", "GB"),
    with_aliases(europe("Vatican City", "VA"), &["Holy See"]),
    // North & Central America
    americas_oceania("Belize", "BZ", 1502),
    americas_oceania("Canada", "CA", 1497),
    americas_oceania("Costa Rica", "CR", 1502),
    americas_oceania("Guatemala", "GT", 1523),
    americas_oceania("Honduras", "HN", 1502),
    americas_oceania("Mexico", "MX", 1519),
    americas_oceania("Nicaragua", "NI", 1524),
    americas_oceania("Panama", "PA", 1501),
    americas_oceania("El Salvador", "SV", 1524),
    americas_oceania("United States", "US", 1492),
    // South America
    americas_oceania("Argentina", "AR", 1516),
    americas_oceania("Bolivia", "BO", 1535),
    americas_oceania("Brazil", "BR", 1500),
    americas_oceania("Chile", "CL", 1520),
    americas_oceania("Colombia", "CO", 1499),
    americas_oceania("Ecuador", "EC", 1531),
    americas_oceania("Guyana", "GY", 1498),
    americas_oceania("Peru", "PE", 1526),
    americas_oceania("Paraguay", "PY", 1537),
    americas_oceania("Suriname", "SR", 1593),
    americas_oceania("Uruguay", "UY", 1516),
    americas_oceania("Venezuela", "VE", 1498),
    // Caribbean
    americas_oceania("Antigua and Barbuda", "AG", 1493),
    americas_oceania("Barbados", "BB", 1492),
    with_aliases(americas_oceania("Bahamas", "BS", 1492), &["The Bahamas"]),
    americas_oceania("Cuba", "CU", 1492),
    americas_oceania("Dominica", "DM", 1493),
    americas_oceania("Dominican Republic", "DO", 1492),
    americas_oceania("Grenada", "GD", 1498),
    americas_oceania("Haiti", "HT", 1492),
    americas_oceania("Jamaica", "JM", 1494),
    americas_oceania("Saint Kitts and Nevis", "KN", 1493),
    americas_oceania("Saint Lucia", "LC", 1502),
    americas_oceania("Trinidad and Tobago", "TT", 1498),
    americas_oceania("Saint Vincent and the Grenadines", "VC", 1498),
    // Oceania
    americas_oceania("Australia", "AU", 1606),
    with_aliases(
        americas_oceania("Micronesia", "FM", 1529),
        &["Federated States of Micronesia"],
    ),
    americas_oceania("Fiji", "FJ", 1643),
    americas_oceania("Kiribati", "KI", 1528),
    americas_oceania("Marshall Islands", "MH", 1529),
    americas_oceania("Nauru", "NR", 1798),
    americas_oceania("New Zealand", "NZ", 1642),
    americas_oceania("Palau", "PW", 1543),
    americas_oceania("Papua New Guinea", "PG", 1526),
    americas_oceania("Solomon Islands", "SB", 1568),
    americas_oceania("Tonga", "TO", 1616),
    americas_oceania("Tuvalu", "TV", 1568),
    americas_oceania("Vanuatu", "VU", 1606),
    americas_oceania("Samoa", "WS", 1722),
];

/// Region and discovery-year lookup keyed by one country representation
#[derive(Debug, Clone)]
pub struct RegionTable {
    field: CountryField,
    by_key: HashMap<String, CountryInfo>,
}

impl RegionTable {
    /// Built-in table keyed by `field`
    pub fn new(field: CountryField) -> Self {
        Self::from_countries(field, COUNTRIES.iter().cloned())
    }

    /// Table over a custom country list
    pub fn from_countries(field: CountryField, countries: impl IntoIterator<Item = CountryInfo>) -> Self {
        let mut by_key = HashMap::new();
        for info in countries {
            match field {
                CountryField::Name => {
                    for alias in info.aliases {
                        by_key.insert(alias.to_string(), info.clone());
                    }
                    by_key.insert(info.name.to_string(), info);
                }
                CountryField::Code => {
                    by_key.insert(info.code.to_string(), info);
                }
            }
        }
        Self { field, by_key }
    }

    pub fn field(&self) -> CountryField {
        self.field
    }

    /// Region of a country; undetermined or unlisted countries are `Other`
    pub fn region(&self, country: Option<&str>) -> Region {
        country
            .and_then(|c| self.by_key.get(c))
            .map(|info| info.region)
            .unwrap_or(Region::Other)
    }

    /// Recorded discovery year (Americas/Oceania members only)
    pub fn discovery_year(&self, country: &str) -> Option<i32> {
        self.by_key.get(country).and_then(|info| info.discovery_year)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
