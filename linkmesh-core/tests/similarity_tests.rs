// Tests for URL similarity

use linkmesh_core::config::SimilarityConfig;
use linkmesh_core::eligibility::{EligiblePages, filter_eligible};
use linkmesh_core::similarity::{
    PagePair, PairScope, SimilarityMatrix, TermSpace, compute_similarity, sparse_dot,
};
use linkmesh_core::{DegenerateInput, Page, SimilarityScope};
use std::collections::BTreeSet;

fn eligible(urls: &[&str]) -> EligiblePages {
    let pages = urls.iter().map(|url| Page::new(*url, 10.0)).collect();
    filter_eligible(pages, 0.0).unwrap().eligible
}

fn full(pages: &EligiblePages, threshold: f64) -> SimilarityMatrix {
    compute_similarity(pages, &SimilarityConfig::default(), threshold, &PairScope::All)
}

const BLOG: &[&str] = &[
    "https://example.com/blog/seo-tips",
    "https://example.com/blog/seo-guide",
    "https://example.com/blog/seo-tools",
    "https://example.com/shop/red-shoes",
];

// ============================================================================
// Vector Space Tests
// ============================================================================

#[test]
fn test_sparse_dot_matches_shared_terms() {
    let a = vec![(0, 0.6), (2, 0.8)];
    let b = vec![(1, 1.0), (2, 0.5)];
    assert!((sparse_dot(&a, &b) - 0.4).abs() < 1e-12);
    assert_eq!(sparse_dot(&a, &[]), 0.0);
}

#[test]
fn test_term_space_vocabulary_is_sorted() {
    let space = TermSpace::build(BLOG.iter().copied(), 2, 1000);
    let vocabulary = space.vocabulary();

    assert!(vocabulary.windows(2).all(|w| w[0] < w[1]));
    assert!(vocabulary.contains(&"seo".to_string()));
    assert!(vocabulary.contains(&"blog seo".to_string()));
    assert_eq!(space.document_count(), 4);
}

#[test]
fn test_term_space_respects_max_features() {
    let space = TermSpace::build(BLOG.iter().copied(), 2, 3);
    // blog, seo and "blog seo" appear in three documents each
    assert_eq!(space.vocabulary(), &["blog", "blog seo", "seo"]);
}

#[test]
fn test_identical_paths_have_similarity_one() {
    let space = TermSpace::build(
        ["https://a.com/blog/seo-tips", "https://b.com/blog/seo-tips?ref=1"],
        2,
        1000,
    );
    assert!((space.cosine(0, 1) - 1.0).abs() < 1e-9);
}

// ============================================================================
// Pair Tests
// ============================================================================

#[test]
fn test_page_pair_is_canonical() {
    let pair = PagePair::new(5, 2).unwrap();
    assert_eq!((pair.low(), pair.high()), (2, 5));
    assert_eq!(PagePair::new(2, 5), Some(pair));
    assert!(PagePair::new(3, 3).is_none());
}

// ============================================================================
// Matrix Tests
// ============================================================================

#[test]
fn test_matrix_is_symmetric_without_diagonal() {
    let pages = eligible(BLOG);
    let matrix = full(&pages, 0.1);

    for a in 0..pages.len() {
        assert!(matrix.get(a, a).is_none());
        for b in 0..pages.len() {
            assert_eq!(matrix.get(a, b), matrix.get(b, a));
        }
    }

    let by_url = matrix.similarity(BLOG[0], BLOG[1]);
    assert_eq!(by_url, matrix.similarity(BLOG[1], BLOG[0]));
    assert!(by_url.unwrap() > 0.1);
}

#[test]
fn test_pairs_without_shared_terms_are_never_stored() {
    let pages = eligible(BLOG);
    let matrix = full(&pages, 0.0);

    assert!(matrix.similarity(BLOG[0], BLOG[3]).is_none());
    assert!(matrix.iter().all(|(_, _, sim)| sim > 0.0));
}

#[test]
fn test_encoded_characters_do_not_create_shared_terms() {
    let urls = [
        "https://example.fr/recettes/été",
        "https://example.fr/boutique/thé",
        "https://example.fr/recettes/tarte-fraises",
    ];
    let pages = eligible(&urls);
    let matrix = full(&pages, 0.0);

    assert!(matrix.similarity(urls[0], urls[1]).is_none());
    assert!(matrix.similarity(urls[0], urls[2]).is_some());
    assert_eq!(matrix.len(), 1);
}

#[test]
fn test_threshold_filters_pairs() {
    let pages = eligible(BLOG);

    let loose = full(&pages, 0.1);
    let strict = full(&pages, 0.9);

    assert_eq!(loose.len(), 3);
    assert!(strict.is_empty());
    assert!(strict.degenerate().is_none());
    assert!(loose.iter().all(|(_, _, sim)| sim >= loose.threshold()));
}

#[test]
fn test_similarity_is_deterministic() {
    let pages = eligible(BLOG);

    let first: Vec<(String, String, f64)> = full(&pages, 0.1)
        .iter()
        .map(|(a, b, s)| (a.to_string(), b.to_string(), s))
        .collect();
    let second: Vec<(String, String, f64)> = full(&pages, 0.1)
        .iter()
        .map(|(a, b, s)| (a.to_string(), b.to_string(), s))
        .collect();

    assert_eq!(first, second);
}

#[test]
fn test_neighbours_are_in_page_order() {
    let pages = eligible(BLOG);
    let matrix = full(&pages, 0.1);

    let neighbours: Vec<usize> = matrix.neighbours(1).iter().map(|(idx, _)| *idx).collect();
    assert_eq!(neighbours, vec![0, 2]);
    assert!(matrix.neighbours(3).is_empty());
    assert!(matrix.neighbours(99).is_empty());
}

#[test]
fn test_involving_scope_skips_unrelated_pairs() {
    let pages = eligible(BLOG);
    let focus: BTreeSet<usize> = [0].into_iter().collect();

    let matrix = compute_similarity(
        &pages,
        &SimilarityConfig::default(),
        0.1,
        &PairScope::Involving(focus),
    );

    assert_eq!(matrix.scope(), SimilarityScope::PriorityTargets);
    assert!(matrix.get(0, 1).is_some());
    assert!(matrix.get(0, 2).is_some());
    assert!(matrix.get(1, 2).is_none());

    // Pairs that are computed match the full matrix
    let all = full(&pages, 0.1);
    assert_eq!(matrix.get(0, 1), all.get(0, 1));
}

// ============================================================================
// Degenerate Input Tests
// ============================================================================

#[test]
fn test_single_page_is_degenerate() {
    let pages = eligible(&["https://example.com/blog/seo-tips"]);
    let matrix = full(&pages, 0.1);

    assert!(matrix.is_empty());
    assert_eq!(
        matrix.degenerate(),
        Some(&DegenerateInput::TooFewEligiblePages { count: 1 })
    );
}

#[test]
fn test_urls_without_terms_are_degenerate() {
    let pages = eligible(&["https://example.com/", "https://example.com/2024/10/"]);
    let matrix = full(&pages, 0.1);

    assert!(matrix.is_empty());
    assert_eq!(matrix.degenerate(), Some(&DegenerateInput::EmptyVocabulary));
}
