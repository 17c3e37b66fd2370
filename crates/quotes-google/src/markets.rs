//! Exchange list resolution.

/// Market tried when neither a hint nor a configured list yields anything.
pub const FALLBACK_MARKET: &str = "NASDAQ";

/// Builds the ordered list of markets to try for one lookup.
///
/// Hinted markets come first, then the configured defaults. Both inputs are
/// split on commas and whitespace, uppercased, and de-duplicated with the first
/// occurrence winning. An empty result falls back to [`FALLBACK_MARKET`].
///
/// ```
/// use quotes_google::resolve_markets;
///
/// let markets = resolve_markets(Some("nysearca NASDAQ"), "NASDAQ,NYSE");
/// assert_eq!(markets, ["NYSEARCA", "NASDAQ", "NYSE"]);
/// ```
#[must_use]
pub fn resolve_markets(hint: Option<&str>, configured: &str) -> Vec<String> {
    let mut ordered: Vec<String> = Vec::new();
    let parts = hint.into_iter().chain(std::iter::once(configured));
    for market in parts.flat_map(split_markets) {
        if !ordered.contains(&market) {
            ordered.push(market);
        }
    }
    if ordered.is_empty() {
        ordered.push(FALLBACK_MARKET.to_string());
    }
    ordered
}

fn split_markets(list: &str) -> impl Iterator<Item = String> + '_ {
    list.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_uppercase)
}
