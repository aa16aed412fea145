//! X search query construction
//!
//! The recent-search endpoint caps query length, so the keyword list is
//! fitted via binary search over prefix lengths. A floor of `MIN_KEYWORDS`
//! keywords is kept even when the minimal query already exceeds the ceiling.

/// Character ceiling for a rendered search query
pub const MAX_QUERY_LEN: usize = 256;

/// Minimum keywords kept regardless of fit
pub const MIN_KEYWORDS: usize = 3;

/// Last-resort keyword set when the configured list yields nothing
pub const FALLBACK_KEYWORDS: [&str; 5] = ["ai", "openai", "nvidia", "microsoft", "google"];

/// Case-insensitive dedupe preserving first-occurrence order and casing
pub fn dedupe_preserve_order(keywords: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for kw in keywords {
        let trimmed = kw.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            out.push(trimmed.to_string());
        }
    }
    out
}

/// Render `(k1 OR "multi word" OR ...) lang:en -is:retweet`
pub fn build_search_query(keywords: &[String]) -> String {
    let ors = keywords
        .iter()
        .map(|k| {
            if k.contains(' ') {
                format!("\"{}\"", k)
            } else {
                k.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" OR ");
    format!("({}) lang:en -is:retweet", ors)
}

/// Largest prefix whose rendered query fits `MAX_QUERY_LEN`, floored at
/// `MIN_KEYWORDS`. Deterministic for a given input list.
pub fn trim_keywords_for_limit(keywords: &[String]) -> Vec<String> {
    if keywords.is_empty() {
        return vec![];
    }

    let mut low = 1usize;
    let mut high = keywords.len();
    let mut best = 1usize;
    while low <= high {
        let mid = (low + high) / 2;
        let query = build_search_query(&keywords[..mid]);
        if query.len() <= MAX_QUERY_LEN {
            best = mid;
            low = mid + 1;
        } else {
            high = mid - 1;
        }
    }

    let best = best.max(MIN_KEYWORDS).min(keywords.len().max(MIN_KEYWORDS));
    keywords[..best.min(keywords.len())].to_vec()
}

/// Owned copy of the fallback keyword set
pub fn fallback_keywords() -> Vec<String> {
    FALLBACK_KEYWORDS.iter().map(|s| s.to_string()).collect()
}
