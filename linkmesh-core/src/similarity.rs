//! Thematic similarity between pages, derived from their URL paths.
//!
//! Each page becomes a TF-IDF vector over the corpus vocabulary (terms from
//! [`crate::tokenize`]) and pairs are compared with cosine similarity. Only
//! pairs at or above the configured threshold are kept, in a sparse map keyed
//! by a canonical page pair, so the matrix stays small on large sites.
//!
//! The vocabulary is ordered lexically and dot products are summed in term
//! order, so the same URL set always yields the same scores. Rows are
//! computed in parallel and gathered in row order.

use crate::config::SimilarityConfig;
use crate::diagnostics::{DegenerateInput, SimilarityScope};
use crate::eligibility::EligiblePages;
use crate::tokenize::url_terms;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Instant;
use tracing::{debug, info};

/// Sparse, L2-normalized vector of (term index, weight) sorted by term index
pub type SparseVector = Vec<(usize, f64)>;

/// TF-IDF vectors for a set of documents
#[derive(Debug, Clone, Default)]
pub struct TermSpace {
    vocabulary: Vec<String>,
    vectors: Vec<SparseVector>,
}

impl TermSpace {
    /// Vectorize URLs with smoothed IDF: `ln((1 + n) / (1 + df)) + 1`
    pub fn build<'a>(
        urls: impl IntoIterator<Item = &'a str>,
        ngram_max: usize,
        max_features: usize,
    ) -> Self {
        let documents: Vec<Vec<String>> = urls
            .into_iter()
            .map(|url| url_terms(url, ngram_max))
            .collect();
        let total_docs = documents.len() as f64;

        // term -> (corpus frequency, document frequency)
        let mut corpus: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for terms in &documents {
            let unique: BTreeSet<&str> = terms.iter().map(String::as_str).collect();
            for term in terms {
                corpus.entry(term.as_str()).or_default().0 += 1;
            }
            for term in unique {
                corpus.entry(term).or_default().1 += 1;
            }
        }

        let mut kept: Vec<(&str, (usize, usize))> = corpus.into_iter().collect();
        if kept.len() > max_features {
            // Most frequent terms first, ties in term order
            kept.sort_by(|(a_term, (a_tf, _)), (b_term, (b_tf, _))| {
                b_tf.cmp(a_tf).then_with(|| a_term.cmp(b_term))
            });
            kept.truncate(max_features);
            kept.sort_by(|(a, _), (b, _)| a.cmp(b));
        }

        let vocabulary: Vec<String> = kept.iter().map(|(term, _)| term.to_string()).collect();
        let term_index: HashMap<&str, usize> = kept
            .iter()
            .enumerate()
            .map(|(idx, (term, _))| (*term, idx))
            .collect();
        let idf: Vec<f64> = kept
            .iter()
            .map(|(_, (_, df))| ((1.0 + total_docs) / (1.0 + *df as f64)).ln() + 1.0)
            .collect();

        let vectors = documents
            .iter()
            .map(|terms| {
                let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
                for term in terms {
                    if let Some(&idx) = term_index.get(term.as_str()) {
                        *counts.entry(idx).or_insert(0.0) += 1.0;
                    }
                }
                let weighted: SparseVector = counts
                    .into_iter()
                    .map(|(idx, count)| (idx, count * idf[idx]))
                    .collect();
                l2_normalize(weighted)
            })
            .collect();

        Self {
            vocabulary,
            vectors,
        }
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn vector(&self, idx: usize) -> Option<&SparseVector> {
        self.vectors.get(idx)
    }

    pub fn document_count(&self) -> usize {
        self.vectors.len()
    }

    /// Cosine similarity of two documents, within [0, 1]
    pub fn cosine(&self, a: usize, b: usize) -> f64 {
        match (self.vectors.get(a), self.vectors.get(b)) {
            (Some(va), Some(vb)) => sparse_dot(va, vb).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}

fn l2_normalize(vector: SparseVector) -> SparseVector {
    let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm == 0.0 {
        return vector;
    }
    vector.into_iter().map(|(idx, w)| (idx, w / norm)).collect()
}

/// Merge-join dot product, summed in ascending term order
pub fn sparse_dot(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut dot = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot
}

/// Unordered pair of page indices, stored as (low, high)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PagePair {
    low: usize,
    high: usize,
}

impl PagePair {
    /// `None` for the diagonal: a page is never paired with itself
    pub fn new(a: usize, b: usize) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { low: a, high: b }),
            std::cmp::Ordering::Greater => Some(Self { low: b, high: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn low(&self) -> usize {
        self.low
    }

    pub fn high(&self) -> usize {
        self.high
    }
}

/// Which pairs to compute
#[derive(Debug, Clone)]
pub enum PairScope {
    All,
    /// Only pairs with at least one page in the set
    Involving(BTreeSet<usize>),
}

impl PairScope {
    pub fn kind(&self) -> SimilarityScope {
        match self {
            PairScope::All => SimilarityScope::Full,
            PairScope::Involving(_) => SimilarityScope::PriorityTargets,
        }
    }

    /// Partners `j > i` that row `i` must be compared with
    fn partners(&self, i: usize, n: usize) -> Vec<usize> {
        match self {
            PairScope::All => (i + 1..n).collect(),
            PairScope::Involving(focus) if focus.contains(&i) => (i + 1..n).collect(),
            PairScope::Involving(focus) => focus.range(i + 1..n).copied().collect(),
        }
    }
}

/// Sparse symmetric similarity map over the eligible pages
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    urls: Vec<String>,
    index: HashMap<String, usize>,
    pairs: BTreeMap<PagePair, f64>,
    neighbours: Vec<Vec<(usize, f64)>>,
    threshold: f64,
    scope: SimilarityScope,
    degenerate: Option<DegenerateInput>,
}

impl SimilarityMatrix {
    fn new(
        urls: Vec<String>,
        pairs: BTreeMap<PagePair, f64>,
        threshold: f64,
        scope: SimilarityScope,
        degenerate: Option<DegenerateInput>,
    ) -> Self {
        let index = urls
            .iter()
            .enumerate()
            .map(|(idx, url)| (url.clone(), idx))
            .collect();

        let mut neighbours = vec![Vec::new(); urls.len()];
        for (pair, &sim) in &pairs {
            neighbours[pair.low].push((pair.high, sim));
            neighbours[pair.high].push((pair.low, sim));
        }
        for list in &mut neighbours {
            list.sort_by_key(|(idx, _)| *idx);
        }

        Self {
            urls,
            index,
            pairs,
            neighbours,
            threshold,
            scope,
            degenerate,
        }
    }

    /// Empty matrix tagged with the reason nothing could be computed
    pub fn empty(
        urls: Vec<String>,
        threshold: f64,
        scope: SimilarityScope,
        reason: DegenerateInput,
    ) -> Self {
        Self::new(urls, BTreeMap::new(), threshold, scope, Some(reason))
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn scope(&self) -> SimilarityScope {
        self.scope
    }

    pub fn degenerate(&self) -> Option<&DegenerateInput> {
        self.degenerate.as_ref()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn url(&self, idx: usize) -> Option<&str> {
        self.urls.get(idx).map(String::as_str)
    }

    /// Similarity by page index; `None` below threshold and on the diagonal
    pub fn get(&self, a: usize, b: usize) -> Option<f64> {
        PagePair::new(a, b).and_then(|pair| self.pairs.get(&pair).copied())
    }

    /// Similarity by URL; `None` below threshold and on the diagonal
    pub fn similarity(&self, a: &str, b: &str) -> Option<f64> {
        let a = *self.index.get(a)?;
        let b = *self.index.get(b)?;
        self.get(a, b)
    }

    /// Pages similar to `idx`, in page order
    pub fn neighbours(&self, idx: usize) -> &[(usize, f64)] {
        self.neighbours.get(idx).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every stored pair as (url, url, similarity) in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.pairs.iter().map(|(pair, &sim)| {
            (
                self.urls[pair.low].as_str(),
                self.urls[pair.high].as_str(),
                sim,
            )
        })
    }
}

/// Compute the similarity matrix for the eligible pages
///
/// Pairs with similarity below `threshold`, or with no shared term at all,
/// are left out of the matrix.
pub fn compute_similarity(
    pages: &EligiblePages,
    config: &SimilarityConfig,
    threshold: f64,
    scope: &PairScope,
) -> SimilarityMatrix {
    let start = Instant::now();
    let urls: Vec<String> = pages.urls().map(str::to_string).collect();
    let n = urls.len();

    if n < 2 {
        debug!("Similarity skipped: {} eligible page(s)", n);
        return SimilarityMatrix::empty(
            urls,
            threshold,
            scope.kind(),
            DegenerateInput::TooFewEligiblePages { count: n },
        );
    }

    let space = TermSpace::build(
        urls.iter().map(String::as_str),
        config.ngram_max,
        config.max_features,
    );
    if space.vocabulary().is_empty() {
        debug!("Similarity skipped: empty vocabulary");
        return SimilarityMatrix::empty(
            urls,
            threshold,
            scope.kind(),
            DegenerateInput::EmptyVocabulary,
        );
    }

    let rows: Vec<Vec<(PagePair, f64)>> = (0..n)
        .into_par_iter()
        .map(|i| {
            scope
                .partners(i, n)
                .into_iter()
                .filter_map(|j| {
                    let sim = space.cosine(i, j);
                    if sim > 0.0 && sim >= threshold {
                        PagePair::new(i, j).map(|pair| (pair, sim))
                    } else {
                        None
                    }
                })
                .collect()
        })
        .collect();

    let pairs: BTreeMap<PagePair, f64> = rows.into_iter().flatten().collect();

    info!(
        "Built similarity matrix: {} pages, {} terms, {} pairs above {} ({} scope) in {:?}",
        n,
        space.vocabulary().len(),
        pairs.len(),
        threshold,
        scope.kind().as_str(),
        start.elapsed()
    );

    SimilarityMatrix::new(urls, pairs, threshold, scope.kind(), None)
}
