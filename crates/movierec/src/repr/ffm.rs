//! Weight storage for field-aware factorization machines.

use ndarray::{Array1, Array3, ArrayView1, ArrayView3};

use crate::encoding::FeatureVector;

/// Bias, linear weights and field-aware latent vectors.
///
/// `latent[[j, f, ..]]` is the vector feature `j` uses when interacting with a feature of
/// field `f`.
///
/// ```text
/// logit(x) = bias + Σ_j w[j]·x_j + Σ_{j1<j2} ⟨v[j1, field(j2)], v[j2, field(j1)]⟩·x_j1·x_j2
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAwareWeights {
    pub(crate) bias: f32,
    /// Shape `[n_features]`.
    pub(crate) linear: Array1<f32>,
    /// Shape `[n_features, n_fields, latent_dim]`.
    pub(crate) latent: Array3<f32>,
}

impl FieldAwareWeights {
    pub fn zeros(n_features: usize, n_fields: usize, latent_dim: usize) -> Self {
        Self {
            bias: 0.0,
            linear: Array1::zeros(n_features),
            latent: Array3::zeros((n_features, n_fields, latent_dim)),
        }
    }

    /// Assemble weights from parts, checking that shapes agree.
    pub fn from_parts(bias: f32, linear: Array1<f32>, latent: Array3<f32>) -> Result<Self, String> {
        if latent.dim().0 != linear.len() {
            return Err(format!(
                "latent table has {} features but linear has {}",
                latent.dim().0,
                linear.len()
            ));
        }
        Ok(Self {
            bias,
            linear,
            latent,
        })
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.linear.len()
    }

    #[inline]
    pub fn n_fields(&self) -> usize {
        self.latent.dim().1
    }

    #[inline]
    pub fn latent_dim(&self) -> usize {
        self.latent.dim().2
    }

    #[inline]
    pub fn bias(&self) -> f32 {
        self.bias
    }

    pub fn linear(&self) -> ArrayView1<'_, f32> {
        self.linear.view()
    }

    pub fn latent(&self) -> ArrayView3<'_, f32> {
        self.latent.view()
    }

    /// Raw logit for an encoded feature vector.
    ///
    /// Features whose index or field fall outside the table are ignored.
    pub fn logit(&self, x: &FeatureVector) -> f32 {
        let features: Vec<_> = x
            .iter()
            .filter(|f| (f.index as usize) < self.n_features() && f.field < self.n_fields())
            .collect();

        let mut logit = self.bias;
        for f in &features {
            logit += self.linear[f.index as usize] * f.value;
        }

        for (a, fa) in features.iter().enumerate() {
            for fb in &features[a + 1..] {
                let va = self.latent.slice(ndarray::s![fa.index as usize, fb.field, ..]);
                let vb = self.latent.slice(ndarray::s![fb.index as usize, fa.field, ..]);
                logit += va.dot(&vb) * fa.value * fb.value;
            }
        }
        logit
    }

    pub fn is_finite(&self) -> bool {
        self.bias.is_finite()
            && self.linear.iter().all(|v| v.is_finite())
            && self.latent.iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::Feature;
    use approx::assert_abs_diff_eq;

    #[test]
    fn logit_sums_linear_and_pairwise_terms() {
        let mut w = FieldAwareWeights::zeros(4, 2, 2);
        w.bias = 0.5;
        w.linear[0] = 1.0;
        w.linear[2] = -2.0;
        // feature 0 (field 0) meeting field 1, feature 2 (field 1) meeting field 0
        w.latent[[0, 1, 0]] = 1.0;
        w.latent[[0, 1, 1]] = 2.0;
        w.latent[[2, 0, 0]] = 3.0;
        w.latent[[2, 0, 1]] = 0.5;

        let x = FeatureVector {
            features: vec![
                Feature { field: 0, index: 0, value: 1.0 },
                Feature { field: 1, index: 2, value: 0.5 },
            ],
        };
        // 0.5 + 1.0 - 1.0 + (3 + 1) * 0.5
        assert_abs_diff_eq!(w.logit(&x), 2.5);
    }

    #[test]
    fn out_of_range_features_ignored() {
        let w = FieldAwareWeights::zeros(2, 2, 1);
        let x = FeatureVector {
            features: vec![Feature { field: 5, index: 99, value: 1.0 }],
        };
        assert_eq!(w.logit(&x), 0.0);
    }
}
