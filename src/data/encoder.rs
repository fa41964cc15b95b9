// ============================================================
// Layer 4 — Categorical Encoders
// ============================================================
// Two one-hot flavours for string columns:
//
//   IndexVocabulary  — learns the categories seen during fit, in
//                      order of first appearance. Category k maps
//                      to a vector with a single 1.0 at slot k.
//                      Unseen categories map to all zeros.
//
//   HashedEncoder    — 2^bits slots, a category goes to
//                      hash(category) mod 2^bits. Nothing to learn
//                      for encoding; fit only remembers which
//                      categories landed in which slot so the
//                      slots can be named in reports.
//
// Hashing uses FxHasher, which is stable across runs.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

use crate::error::{AttritionError, Result};

pub const MAX_HASH_BITS: u32 = 16;

// ─── Index encoding ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexVocabulary {
    categories: Vec<String>,
}

impl IndexVocabulary {
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut categories: Vec<String> = Vec::new();
        for v in values {
            if !categories.iter().any(|c| c == v) {
                categories.push(v.to_string());
            }
        }
        Self { categories }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn index_of(&self, value: &str) -> Option<usize> {
        self.categories.iter().position(|c| c == value)
    }

    /// Write the one-hot vector for `value` into `out` (len() slots).
    pub fn encode_into(&self, value: &str, out: &mut [f32]) {
        out.fill(0.0);
        if let Some(i) = self.index_of(value) {
            out[i] = 1.0;
        }
    }

    pub fn encode(&self, value: &str) -> Vec<f32> {
        let mut out = vec![0.0; self.len()];
        self.encode_into(value, &mut out);
        out
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }
}

// ─── Hashed encoding ──────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashedEncoder {
    bits: u32,
    /// Categories observed during fit, per slot
    seen: Vec<Vec<String>>,
}

impl HashedEncoder {
    pub fn new(bits: u32) -> Result<Self> {
        if bits == 0 || bits > MAX_HASH_BITS {
            return Err(AttritionError::InvalidArgument(format!(
                "hash bits must be in 1..={MAX_HASH_BITS}, got {bits}"
            )));
        }
        Ok(Self { bits, seen: vec![Vec::new(); 1 << bits] })
    }

    pub fn fit<'a>(bits: u32, values: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut enc = Self::new(bits)?;
        for v in values {
            let slot = enc.slot_of(v);
            if !enc.seen[slot].iter().any(|c| c == v) {
                enc.seen[slot].push(v.to_string());
            }
        }
        Ok(enc)
    }

    pub fn width(&self) -> usize {
        1 << self.bits
    }

    pub fn slot_of(&self, value: &str) -> usize {
        let mut hasher = FxHasher::default();
        value.hash(&mut hasher);
        (hasher.finish() as usize) & (self.width() - 1)
    }

    pub fn encode_into(&self, value: &str, out: &mut [f32]) {
        out.fill(0.0);
        out[self.slot_of(value)] = 1.0;
    }

    pub fn encode(&self, value: &str) -> Vec<f32> {
        let mut out = vec![0.0; self.width()];
        self.encode_into(value, &mut out);
        out
    }

    /// "a|b" for slots that received categories during fit, "#k" otherwise.
    pub fn slot_labels(&self) -> Vec<String> {
        self.seen
            .iter()
            .enumerate()
            .map(|(k, cats)| {
                if cats.is_empty() {
                    format!("#{k}")
                } else {
                    cats.join("|")
                }
            })
            .collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_keeps_first_appearance_order() {
        let vocab = IndexVocabulary::fit(["Sales", "R&D", "Sales", "HR", "R&D"]);
        assert_eq!(vocab.categories(), &["Sales", "R&D", "HR"]);
    }

    #[test]
    fn index_one_hot_has_single_nonzero() {
        let vocab = IndexVocabulary::fit(["Single", "Married", "Divorced"]);
        let v = vocab.encode("Married");
        assert_eq!(v, vec![0.0, 1.0, 0.0]);
        assert_eq!(v.iter().filter(|x| **x != 0.0).count(), 1);
    }

    #[test]
    fn unseen_category_is_all_zero() {
        let vocab = IndexVocabulary::fit(["Yes", "No"]);
        assert_eq!(vocab.encode("Maybe"), vec![0.0, 0.0]);
    }

    #[test]
    fn hashed_slot_is_stable_and_in_range() {
        let enc = HashedEncoder::new(3).unwrap();
        let a = enc.slot_of("Travel_Rarely");
        assert_eq!(a, enc.slot_of("Travel_Rarely"));
        assert!(a < 8);
        let v = enc.encode("Travel_Rarely");
        assert_eq!(v.len(), 8);
        assert_eq!(v[a], 1.0);
        assert_eq!(v.iter().sum::<f32>(), 1.0);
    }

    #[test]
    fn hashed_unseen_category_still_lands_in_a_slot() {
        let enc = HashedEncoder::fit(4, ["a", "b"]).unwrap();
        let v = enc.encode("never-seen");
        assert_eq!(v.iter().filter(|x| **x == 1.0).count(), 1);
    }

    #[test]
    fn hashed_slot_labels_name_fitted_categories() {
        let enc = HashedEncoder::fit(2, ["Sales"]).unwrap();
        let labels = enc.slot_labels();
        assert_eq!(labels.len(), 4);
        assert_eq!(labels[enc.slot_of("Sales")], "Sales");
    }

    #[test]
    fn hash_bits_are_bounded() {
        assert!(HashedEncoder::new(0).is_err());
        assert!(HashedEncoder::new(MAX_HASH_BITS + 1).is_err());
        assert!(HashedEncoder::new(MAX_HASH_BITS).is_ok());
    }
}
