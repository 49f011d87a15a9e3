//! Latent factor storage for matrix factorization.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Biased latent factors over dense user and movie keys.
///
/// Row `k` of each table belongs to key `k`; row 0 is the unknown key and stays at zero,
/// so an unseen id contributes nothing beyond the global mean.
///
/// ```text
/// prediction(u, m) = global_mean + user_bias[u] + movie_bias[m]
///                  + user_factors[u] · movie_factors[m]
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LatentFactors {
    pub(crate) global_mean: f32,
    pub(crate) user_bias: Array1<f32>,
    pub(crate) movie_bias: Array1<f32>,
    /// Shape `[n_user_keys, rank]`.
    pub(crate) user_factors: Array2<f32>,
    /// Shape `[n_movie_keys, rank]`.
    pub(crate) movie_factors: Array2<f32>,
}

impl LatentFactors {
    /// Zero-initialized factors. Key counts include the unknown slot.
    pub fn zeros(n_user_keys: usize, n_movie_keys: usize, rank: usize) -> Self {
        Self {
            global_mean: 0.0,
            user_bias: Array1::zeros(n_user_keys),
            movie_bias: Array1::zeros(n_movie_keys),
            user_factors: Array2::zeros((n_user_keys, rank)),
            movie_factors: Array2::zeros((n_movie_keys, rank)),
        }
    }

    /// Assemble factors from parts, checking that shapes agree.
    pub fn from_parts(
        global_mean: f32,
        user_bias: Array1<f32>,
        movie_bias: Array1<f32>,
        user_factors: Array2<f32>,
        movie_factors: Array2<f32>,
    ) -> Result<Self, String> {
        if user_factors.nrows() != user_bias.len() {
            return Err(format!(
                "user factors have {} rows but {} biases",
                user_factors.nrows(),
                user_bias.len()
            ));
        }
        if movie_factors.nrows() != movie_bias.len() {
            return Err(format!(
                "movie factors have {} rows but {} biases",
                movie_factors.nrows(),
                movie_bias.len()
            ));
        }
        if user_factors.ncols() != movie_factors.ncols() {
            return Err(format!(
                "rank mismatch: users {} vs movies {}",
                user_factors.ncols(),
                movie_factors.ncols()
            ));
        }
        if user_bias.is_empty() || movie_bias.is_empty() {
            return Err("factor tables must include the unknown row".into());
        }
        Ok(Self {
            global_mean,
            user_bias,
            movie_bias,
            user_factors,
            movie_factors,
        })
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.user_factors.ncols()
    }

    /// Number of user rows, including the unknown row.
    #[inline]
    pub fn n_user_keys(&self) -> usize {
        self.user_bias.len()
    }

    /// Number of movie rows, including the unknown row.
    #[inline]
    pub fn n_movie_keys(&self) -> usize {
        self.movie_bias.len()
    }

    #[inline]
    pub fn global_mean(&self) -> f32 {
        self.global_mean
    }

    pub fn user_bias(&self) -> ArrayView1<'_, f32> {
        self.user_bias.view()
    }

    pub fn movie_bias(&self) -> ArrayView1<'_, f32> {
        self.movie_bias.view()
    }

    pub fn user_factors(&self) -> ArrayView2<'_, f32> {
        self.user_factors.view()
    }

    pub fn movie_factors(&self) -> ArrayView2<'_, f32> {
        self.movie_factors.view()
    }

    /// Score a pair of dense keys. Out-of-range keys are treated as unknown.
    #[inline]
    pub fn predict(&self, user_key: u32, movie_key: u32) -> f32 {
        let u = self.clamp_user(user_key);
        let m = self.clamp_movie(movie_key);
        self.global_mean
            + self.user_bias[u]
            + self.movie_bias[m]
            + self.user_factors.row(u).dot(&self.movie_factors.row(m))
    }

    #[inline]
    fn clamp_user(&self, key: u32) -> usize {
        let k = key as usize;
        if k < self.n_user_keys() { k } else { 0 }
    }

    #[inline]
    fn clamp_movie(&self, key: u32) -> usize {
        let k = key as usize;
        if k < self.n_movie_keys() { k } else { 0 }
    }

    /// Whether every stored value is finite.
    pub fn is_finite(&self) -> bool {
        self.global_mean.is_finite()
            && self.user_bias.iter().all(|v| v.is_finite())
            && self.movie_bias.iter().all(|v| v.is_finite())
            && self.user_factors.iter().all(|v| v.is_finite())
            && self.movie_factors.iter().all(|v| v.is_finite())
    }
}
