use std::collections::BTreeMap;

use super::matrix::SimilarityMatrix;
use super::tokenize::tokenize;

/// Bag-of-words vocabulary fit on one combined corpus. A fresh instance is
/// built for every comparison so both statement sets share one term space.
#[derive(Debug, Clone, Default)]
pub struct TermVectorizer {
    vocabulary: BTreeMap<String, usize>,
}

/// Sparse raw term-frequency vector, entries sorted by term index.
#[derive(Debug, Clone, PartialEq)]
pub struct TermVector {
    entries: Vec<(usize, f64)>,
    norm: f64,
}

impl TermVectorizer {
    pub fn fit<'a>(corpus: impl IntoIterator<Item = &'a str>) -> Self {
        let mut terms = BTreeMap::<String, usize>::new();
        for statement in corpus {
            for token in tokenize(statement) {
                terms.entry(token).or_insert(0);
            }
        }

        // Indices follow sorted term order so identical corpora give identical spaces.
        for (index, slot) in terms.values_mut().enumerate() {
            *slot = index;
        }

        Self { vocabulary: terms }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn transform(&self, statement: &str) -> TermVector {
        let mut counts = BTreeMap::<usize, f64>::new();
        for token in tokenize(statement) {
            if let Some(index) = self.vocabulary.get(&token) {
                *counts.entry(*index).or_insert(0.0) += 1.0;
            }
        }

        let norm = counts
            .values()
            .map(|count| count * count)
            .sum::<f64>()
            .sqrt();

        TermVector {
            entries: counts.into_iter().collect(),
            norm,
        }
    }
}

impl TermVector {
    pub fn is_zero(&self) -> bool {
        self.norm == 0.0
    }

    fn dot(&self, other: &TermVector) -> f64 {
        let mut total = 0.0_f64;
        let mut left = self.entries.iter().peekable();
        let mut right = other.entries.iter().peekable();

        while let (Some((left_index, left_value)), Some((right_index, right_value))) =
            (left.peek(), right.peek())
        {
            match left_index.cmp(right_index) {
                std::cmp::Ordering::Less => {
                    left.next();
                }
                std::cmp::Ordering::Greater => {
                    right.next();
                }
                std::cmp::Ordering::Equal => {
                    total += left_value * right_value;
                    left.next();
                    right.next();
                }
            }
        }

        total
    }
}

pub fn cosine_similarity(left: &TermVector, right: &TermVector) -> f64 {
    if left.is_zero() || right.is_zero() {
        return 0.0;
    }

    (left.dot(right) / (left.norm * right.norm)).clamp(0.0, 1.0)
}

/// Cosine scores for every (generated, gold) pair in a vocabulary fit on both
/// sets. Returns the matrix and whether the shared vocabulary was empty.
pub fn cosine_matrix(generated: &[String], gold: &[String]) -> (SimilarityMatrix, bool) {
    let vectorizer = TermVectorizer::fit(generated.iter().chain(gold.iter()).map(String::as_str));
    let degenerate = vectorizer.vocabulary_len() == 0;

    let generated_vectors = generated
        .iter()
        .map(|statement| vectorizer.transform(statement))
        .collect::<Vec<TermVector>>();
    let gold_vectors = gold
        .iter()
        .map(|statement| vectorizer.transform(statement))
        .collect::<Vec<TermVector>>();

    let matrix = SimilarityMatrix::from_fn(generated.len(), gold.len(), |row, col| {
        cosine_similarity(&generated_vectors[row], &gold_vectors[col])
    });

    (matrix, degenerate)
}
