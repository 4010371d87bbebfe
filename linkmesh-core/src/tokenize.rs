//! URL path tokenization for the similarity engine.

use crate::model::extract_url_path;
use percent_encoding::percent_decode_str;

/// Tokens shorter than this are dropped
const MIN_TOKEN_LENGTH: usize = 2;

/// Common English stop words, filtered before n-grams are built
pub(crate) const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "an", "and", "any", "are", "as", "at", "be", "been", "but",
    "by", "can", "do", "does", "for", "from", "had", "has", "have", "he", "her", "his", "how",
    "if", "in", "into", "is", "it", "its", "me", "more", "my", "no", "not", "of", "on", "or",
    "our", "out", "she", "so", "than", "that", "the", "their", "them", "then", "there", "these",
    "they", "this", "to", "up", "us", "was", "we", "were", "what", "when", "where", "which",
    "who", "why", "will", "with", "you", "your",
];

/// URL boilerplate that says nothing about the topic of a page
pub(crate) const URL_BOILERPLATE: &[&str] = &[
    "www", "html", "htm", "php", "asp", "aspx", "jsp", "index", "default",
];

/// Split a URL path into lowercase topic tokens
///
/// `/blog/SEO-tips_2024.html` becomes `["blog", "seo", "tips"]`. The path
/// is percent-decoded first, so `/recettes/%C3%A9t%C3%A9` yields `été`.
pub fn tokenize_path(url: &str) -> Vec<String> {
    let raw = extract_url_path(url);
    let path = percent_decode_str(&raw).decode_utf8_lossy();

    path.split(|c: char| !c.is_alphanumeric())
        .filter(|raw| !raw.is_empty())
        .map(str::to_lowercase)
        .filter(|token| keep_token(token))
        .collect()
}

/// Tokens plus adjacent-token bigrams when `ngram_max` is 2
pub fn url_terms(url: &str, ngram_max: usize) -> Vec<String> {
    let tokens = tokenize_path(url);
    let mut terms = tokens.clone();

    if ngram_max >= 2 {
        terms.extend(tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
    }

    terms
}

fn keep_token(token: &str) -> bool {
    token.chars().count() >= MIN_TOKEN_LENGTH
        && !token.chars().all(|c| c.is_ascii_digit())
        && !STOP_WORDS.contains(&token)
        && !URL_BOILERPLATE.contains(&token)
}
