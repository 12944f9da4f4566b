// Default friendliness classification.
//
// Upstream data normally arrives with an `isFriendly` column already set.
// This list is only consulted for rows where that column is missing.
use once_cell::sync::Lazy;
use std::collections::HashSet;

static UNFRIENDLY: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "Australia", "Albania", "Andorra", "United Kingdom", "Iceland", "Canada",
        "New Zealand", "Norway", "Rep. of Korea", "North Macedonia", "Singapore",
        "USA", "Ukraine", "Montenegro", "Switzerland", "Japan", "Austria", "Belgium",
        "Bulgaria", "Hungary", "Germany", "Greece", "Denmark", "Ireland", "Spain",
        "Italy", "Cyprus", "Latvia", "Lithuania", "Luxembourg", "Malta",
        "Netherlands", "Poland", "Portugal", "Romania", "Slovakia", "Slovenia",
        "Finland", "France", "Croatia", "Czechia", "Sweden", "Estonia",
    ]
    .into_iter()
    .collect()
});

/// Decides whether a reporting country counts as friendly.
pub trait CountryClassifier: Sync {
    fn is_friendly(&self, reporter_name: &str) -> bool;
}

/// Everything not on the static unfriendly list is friendly.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCountryList;

impl CountryClassifier for StaticCountryList {
    fn is_friendly(&self, reporter_name: &str) -> bool {
        !UNFRIENDLY.contains(reporter_name.trim())
    }
}
