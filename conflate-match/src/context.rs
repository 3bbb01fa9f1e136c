//! Per-call resolution context derived from the item's location.
//!
//! Country codes come from reverse-geocoding the first item location
//! once per call; the address ordering flag and the preset locale are
//! looked up from fixed tables. Nothing here outlives the call.

use conflate_core::item::Coordinate;
use conflate_core::store::ReverseGeocoder;
use rustc_hash::FxHashSet;

/// Countries where a street address reads number-first ("12 High
/// Street" rather than "High Street 12").
pub const NUMBER_FIRST_COUNTRIES: [&str; 9] =
    ["GB", "IE", "US", "MX", "CA", "FR", "AU", "NZ", "ZA"];

/// Country-specific preset translation locales.
const PRESET_LOCALES: [(&str, &str); 5] = [
    ("AU", "en-AU"),
    ("GB", "en-GB"),
    ("IE", "en-GB"),
    ("IN", "en-IN"),
    ("NZ", "en-NZ"),
];

/// Facts derived once per resolution call.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    countries: FxHashSet<String>,
    number_first: bool,
    preset_locale: Option<&'static str>,
}

impl ResolutionContext {
    /// Build the context for an item's locations. Only the first
    /// location is geocoded; an item's locations are close enough that
    /// one lookup suffices.
    ///
    /// A geocoder failure is not fatal: the context only steers address
    /// word order and preset locale, so resolution continues with the
    /// defaults.
    pub async fn for_locations(
        geocoder: &dyn ReverseGeocoder,
        locations: &[Coordinate],
    ) -> Self {
        let Some(first) = locations.first() else {
            return Self::default();
        };

        match geocoder.countries_covering(*first).await {
            Ok(countries) => Self::from_countries(countries),
            Err(e) => {
                tracing::warn!(error = %e, "reverse geocode failed, using default context");
                Self::default()
            }
        }
    }

    fn from_countries(countries: FxHashSet<String>) -> Self {
        let number_first = NUMBER_FIRST_COUNTRIES
            .iter()
            .any(|code| countries.contains(*code));
        let preset_locale = PRESET_LOCALES
            .iter()
            .find(|(code, _)| countries.contains(*code))
            .map(|(_, locale)| *locale);

        ResolutionContext {
            countries,
            number_first,
            preset_locale,
        }
    }

    pub fn countries(&self) -> &FxHashSet<String> {
        &self.countries
    }

    /// True when addresses read number-first here.
    pub fn number_first(&self) -> bool {
        self.number_first
    }

    /// Locale for preset names, `None` for the schema default.
    pub fn preset_locale(&self) -> Option<&'static str> {
        self.preset_locale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn countries(codes: &[&str]) -> FxHashSet<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_number_first_lookup() {
        assert!(ResolutionContext::from_countries(countries(&["GB"])).number_first());
        assert!(!ResolutionContext::from_countries(countries(&["DE"])).number_first());
        assert!(!ResolutionContext::default().number_first());
    }

    #[test]
    fn test_preset_locale_lookup() {
        let ctx = ResolutionContext::from_countries(countries(&["IE"]));
        assert_eq!(ctx.preset_locale(), Some("en-GB"));

        let ctx = ResolutionContext::from_countries(countries(&["JP"]));
        assert_eq!(ctx.preset_locale(), None);
    }
}
