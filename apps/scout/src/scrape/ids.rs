use url::Url;

/// Query parameter carrying the board's job key.
pub const JOB_KEY_PARAM: &str = "jk";

/// Extracts the stable job identifier from a listing URL.
///
/// Listing hrefs are sometimes relative (`/rc/clk?jk=...`), so they are resolved
/// against a placeholder origin first. Returns `None` when the key is absent or empty.
pub fn extract_job_id(listing_url: &str) -> Option<String> {
    let parsed = Url::parse(listing_url).or_else(|_| {
        Url::parse("https://listing.invalid/").and_then(|base| base.join(listing_url))
    });
    let parsed = parsed.ok()?;

    parsed
        .query_pairs()
        .find(|(key, _)| key == JOB_KEY_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
