//! Clean/bad partition of annotated rows
//!
//! A row is bad when any role is flagged as predating its region's
//! discovery, or a role names a city that did not geocode. The check keys
//! on the empty coordinate field, not on an empty flag.

use super::projection::AnnotatedAuthor;
use crate::types::CityRole;

/// Whether a row is fit for mapping
pub fn is_clean(row: &AnnotatedAuthor) -> bool {
    CityRole::ALL.iter().all(|&role| {
        let output = row.output(role);
        let named = row.record.city(role).is_some();
        !output.is_flagged() && (!named || output.is_geocoded())
    })
}

/// Split rows into `(cleaned, bad)`, each in input order
pub fn split_clean(rows: &[AnnotatedAuthor]) -> (Vec<&AnnotatedAuthor>, Vec<&AnnotatedAuthor>) {
    rows.iter().partition(|row| is_clean(row))
}
