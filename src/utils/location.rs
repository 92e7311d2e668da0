/// City/region tokens recovered from a free-text location string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LocationParts<'a> {
    pub city: Option<&'a str>,
    pub region: Option<&'a str>,
}

/// Splits a free-text location such as "Portland, Oregon" on the first comma.
///
/// Everything after the first comma is the region, so "Boston, MA, USA" yields
/// region "MA, USA" rather than "MA". Trial-location strings are themselves
/// comma-joined and matched by substring, which tolerates that truncation.
pub(crate) fn split_location(raw: &str) -> LocationParts<'_> {
    match raw.split_once(',') {
        Some((city, region)) => LocationParts {
            city: non_empty(city),
            region: non_empty(region),
        },
        None => LocationParts {
            city: non_empty(raw),
            region: None,
        },
    }
}

fn non_empty(part: &str) -> Option<&str> {
    let part = part.trim();
    (!part.is_empty()).then_some(part)
}
