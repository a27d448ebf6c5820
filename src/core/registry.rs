use std::collections::HashSet;

/// Country labels as the careers portal spells them.
pub const DEFAULT_COUNTRIES: &[&str] = &[
    "India",
    "United States of America",
    "Ireland",
    "Canada",
    "Portugal",
    "United Kingdom",
    "Poland",
    "Colombia",
    "Mexico",
    "Brazil",
    "Japan",
    "Malaysia",
    "Australia",
    "Singapore",
    "Czechia",
    "Türkiye",
    "Hungary",
    "China",
    "Germany",
    "Indonesia",
    "Israel",
    "Greece",
    "United Arab Emirates",
    "Denmark",
    "Argentina",
    "Belgium",
    "Netherlands",
    "Philippines",
    "Saudi Arabia",
    "Sweden",
    "Hong Kong",
    "Romania",
    "Taiwan",
    "Thailand",
    "Norway",
    "Ukraine",
    "Bulgaria",
    "Chile",
    "Latvia",
    "Pakistan",
    "Vietnam",
    "Kazakhstan",
    "Spain",
    "Austria",
    "Azerbaijan",
    "France",
    "Italy",
    "Morocco",
    "Qatar",
    "Serbia",
    "Costa Rica",
    "Dominican Republic",
    "Egypt",
    "Finland",
    "Georgia",
    "Jordan",
    "Korea, Republic of",
    "New Zealand",
    "Nigeria",
    "Peru",
];

/// Allow-list of canonical country names. Membership is exact and
/// case-sensitive: "canada" and "Canada " are not members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryRegistry {
    countries: HashSet<String>,
}

impl CountryRegistry {
    pub fn new<I, S>(countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            countries: countries.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.countries.contains(label)
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.countries.iter().map(String::as_str)
    }
}

impl Default for CountryRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTRIES.iter().copied())
    }
}
