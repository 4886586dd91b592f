use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Citation markers from PDF extraction (cid:NN), private-use-area
    // escapes, and bare URLs are noise, not vocabulary.
    static ref BAN_LIST: Regex =
        Regex::new(r"(?:cid:\d+)|(?:\\uf\w{3})|(?:https?://)|(?:www\.)").expect("valid regex");
    static ref EDGE_TRIM: Regex = Regex::new(r"(?:^[\W_]+)|(?:[\W_]+$)").expect("valid regex");
}

/// Clean a raw whitespace-delimited token into a countable term.
///
/// Returns `None` for banned tokens (URLs, citation markers, PUA
/// escapes) and for tokens that are empty once leading and trailing
/// non-alphanumeric characters are stripped. Every extraction path
/// must go through this so corpus-wide counts stay comparable.
pub fn normalize_term(token: &str) -> Option<String> {
    if BAN_LIST.is_match(token) {
        return None;
    }
    let cleaned = EDGE_TRIM.replace_all(token, "");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.into_owned())
    }
}
