use crate::normalize;

/// Edit-distance matcher with a fixed tolerance.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityScorer {
    threshold: u32,
}

impl SimilarityScorer {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Levenshtein distance between the normalized forms of `a` and `b`
    pub fn distance(a: &str, b: &str) -> u32 {
        levenshtein(&normalize(a), &normalize(b))
    }

    pub fn is_match(&self, a: &str, b: &str) -> bool {
        Self::distance(a, b) <= self.threshold
    }

    /// Distance and verdict in one pass
    pub fn score(&self, expected: &str, given: &str) -> (u32, bool) {
        let distance = Self::distance(expected, given);
        (distance, distance <= self.threshold)
    }
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new(4)
    }
}

/// Classic two-row Levenshtein over chars; insert, delete and substitute cost 1.
pub fn levenshtein(a: &str, b: &str) -> u32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len() as u32;
    }
    if b.is_empty() {
        return a.len() as u32;
    }

    let mut previous: Vec<u32> = (0..=b.len() as u32).collect();
    let mut current = vec![0u32; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i as u32 + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + u32::from(ca != cb);
            let deletion = previous[j + 1] + 1;
            let insertion = current[j] + 1;
            current[j + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}
