//! Hashed text featurization for free-form ids.
//!
//! Each id is normalized (trimmed, lower-cased) and broken into tokens: the whole word plus
//! the character trigrams of `<id>`. Tokens are hashed into a fixed number of buckets per
//! field, counted, and L2-normalized. The user and movie fields are laid out side by side in
//! one global index space:
//!
//! ```text
//! field 0 (user):  [0, n_buckets)  + OOV slot n_buckets
//! field 1 (movie): [n_buckets + 1, 2 * n_buckets + 1) + OOV slot 2 * n_buckets + 1
//! ```
//!
//! Buckets never hit during fitting are inactive. At encode time they are dropped, and a
//! field left without any active bucket emits its out-of-vocabulary slot instead.

use std::collections::BTreeMap;
use std::hash::Hasher;

use fixedbitset::FixedBitSet;
use siphasher::sip::SipHasher13;

/// Default number of hash buckets per field.
pub const DEFAULT_BUCKETS: u32 = 1024;

/// Number of fields (user, movie).
pub const N_FIELDS: usize = 2;

pub const USER_FIELD: usize = 0;
pub const MOVIE_FIELD: usize = 1;

const HASH_KEYS: (u64, u64) = (0x6d6f_7669_6572_6563, 0x7265_636f_6d6d_656e);

// =============================================================================
// Feature vectors
// =============================================================================

/// One non-zero entry of a [`FeatureVector`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feature {
    /// Field the entry belongs to.
    pub field: usize,
    /// Global feature index.
    pub index: u32,
    pub value: f32,
}

/// Sparse feature vector for one (user, movie) pair, ordered by field then index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureVector {
    pub features: Vec<Feature>,
}

impl FeatureVector {
    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl<'a> IntoIterator for &'a FeatureVector {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

// =============================================================================
// Tokenization
// =============================================================================

fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Whole word plus character trigrams of the `<`/`>`-padded word.
fn tokens(normalized: &str) -> Vec<String> {
    let padded: Vec<char> = std::iter::once('<')
        .chain(normalized.chars())
        .chain(std::iter::once('>'))
        .collect();

    let mut out = Vec::with_capacity(padded.len());
    out.push(normalized.to_string());
    out.extend(padded.windows(3).map(|w| format!("#{}", w.iter().collect::<String>())));
    out
}

fn bucket_of(token: &str, n_buckets: u32) -> u32 {
    let mut hasher = SipHasher13::new_with_keys(HASH_KEYS.0, HASH_KEYS.1);
    hasher.write(token.as_bytes());
    (hasher.finish() % n_buckets as u64) as u32
}

/// Bucket counts for one raw id, in bucket order.
fn bucket_counts(raw: &str, n_buckets: u32) -> BTreeMap<u32, f32> {
    let mut counts = BTreeMap::new();
    for token in tokens(&normalize(raw)) {
        *counts.entry(bucket_of(&token, n_buckets)).or_insert(0.0) += 1.0;
    }
    counts
}

// =============================================================================
// HashedTextEncoder
// =============================================================================

/// Frozen hashed featurizer for (user, movie) id pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct HashedTextEncoder {
    n_buckets: u32,
    active: [FixedBitSet; N_FIELDS],
}

impl HashedTextEncoder {
    /// Fit the active bucket sets from training pairs.
    pub fn fit<'a>(n_buckets: u32, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let n_buckets = n_buckets.max(1);
        let mut active = [
            FixedBitSet::with_capacity(n_buckets as usize),
            FixedBitSet::with_capacity(n_buckets as usize),
        ];
        for (user, movie) in pairs {
            for (field, raw) in [(USER_FIELD, user), (MOVIE_FIELD, movie)] {
                for bucket in bucket_counts(raw, n_buckets).into_keys() {
                    active[field].insert(bucket as usize);
                }
            }
        }
        Self { n_buckets, active }
    }

    /// Rebuild an encoder from stored active bucket lists.
    ///
    /// Returns `None` if `n_buckets` is zero or any bucket is out of range.
    pub fn from_active(n_buckets: u32, active: [Vec<u32>; N_FIELDS]) -> Option<Self> {
        if n_buckets == 0 {
            return None;
        }
        let mut sets = [
            FixedBitSet::with_capacity(n_buckets as usize),
            FixedBitSet::with_capacity(n_buckets as usize),
        ];
        for (set, buckets) in sets.iter_mut().zip(active) {
            for bucket in buckets {
                if bucket >= n_buckets {
                    return None;
                }
                set.insert(bucket as usize);
            }
        }
        Some(Self {
            n_buckets,
            active: sets,
        })
    }

    pub fn n_buckets(&self) -> u32 {
        self.n_buckets
    }

    /// Width of one field's slot range, including its OOV slot.
    #[inline]
    pub fn field_width(&self) -> u32 {
        self.n_buckets + 1
    }

    /// Total number of global feature indices.
    pub fn n_features(&self) -> usize {
        N_FIELDS * self.field_width() as usize
    }

    /// Active buckets of `field`, ascending.
    pub fn active_buckets(&self, field: usize) -> Vec<u32> {
        self.active[field].ones().map(|b| b as u32).collect()
    }

    /// Encode one raw id of `field` into its L2-normalized features.
    pub fn encode_field(&self, field: usize, raw: &str) -> Vec<Feature> {
        let offset = field as u32 * self.field_width();
        let kept: Vec<(u32, f32)> = bucket_counts(raw, self.n_buckets)
            .into_iter()
            .filter(|&(bucket, _)| self.active[field].contains(bucket as usize))
            .collect();

        if kept.is_empty() {
            return vec![Feature {
                field,
                index: offset + self.n_buckets,
                value: 1.0,
            }];
        }

        let norm = kept.iter().map(|&(_, c)| c * c).sum::<f32>().sqrt();
        kept.into_iter()
            .map(|(bucket, count)| Feature {
                field,
                index: offset + bucket,
                value: count / norm,
            })
            .collect()
    }

    /// Encode a (user, movie) pair into one concatenated feature vector.
    ///
    /// Pure: depends only on the inputs and the fitted bucket sets.
    pub fn encode(&self, user: &str, movie: &str) -> FeatureVector {
        let mut features = self.encode_field(USER_FIELD, user);
        features.extend(self.encode_field(MOVIE_FIELD, movie));
        FeatureVector { features }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn fitted() -> HashedTextEncoder {
        HashedTextEncoder::fit(DEFAULT_BUCKETS, [("6", "15"), ("7", "16"), ("8", "15")])
    }

    #[test]
    fn tokens_include_word_and_trigrams() {
        assert_eq!(tokens("15"), vec!["15", "#<15", "#15>"]);
        assert_eq!(tokens("7"), vec!["7", "#<7>"]);
    }

    #[test]
    fn encode_is_deterministic() {
        let a = fitted();
        let b = fitted();
        assert_eq!(a, b);
        assert_eq!(a.encode("6", "15"), b.encode("6", "15"));
        assert_eq!(a.encode(" 6 ", "15"), a.encode("6", "15"));
    }

    #[test]
    fn fields_are_normalized_and_separated() {
        let encoder = fitted();
        let fv = encoder.encode("6", "15");
        for field in [USER_FIELD, MOVIE_FIELD] {
            let sq: f32 = fv.iter().filter(|f| f.field == field).map(|f| f.value * f.value).sum();
            assert_abs_diff_eq!(sq, 1.0, epsilon = 1e-5);
        }
        let width = encoder.field_width();
        assert!(fv.iter().filter(|f| f.field == USER_FIELD).all(|f| f.index < width));
        assert!(fv.iter().filter(|f| f.field == MOVIE_FIELD).all(|f| f.index >= width));
        assert!(fv.iter().all(|f| (f.index as usize) < encoder.n_features()));
    }

    #[test]
    fn unseen_id_falls_back_to_oov_slot() {
        let encoder = HashedTextEncoder::fit(8, [("a", "b")]);
        let unseen = "zzzzzzzzzzzzzzzzzzzz";
        let features = encoder.encode_field(MOVIE_FIELD, unseen);
        // Either some buckets collide with fitted ones or the OOV slot fires.
        assert!(!features.is_empty());

        let empty = HashedTextEncoder::fit(8, std::iter::empty());
        let fv = empty.encode("x", "y");
        assert_eq!(fv.len(), 2);
        assert_eq!(fv.features[0].index, 8);
        assert_eq!(fv.features[1].index, 2 * 9 - 1);
    }

    #[test]
    fn from_active_rebuilds() {
        let encoder = fitted();
        let rebuilt = HashedTextEncoder::from_active(
            encoder.n_buckets(),
            [encoder.active_buckets(USER_FIELD), encoder.active_buckets(MOVIE_FIELD)],
        )
        .unwrap();
        assert_eq!(rebuilt, encoder);
        assert!(HashedTextEncoder::from_active(4, [vec![4], vec![]]).is_none());
    }
}
