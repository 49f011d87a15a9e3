//! Deterministic synthetic data for tests, doctests and benchmarks.

use std::fmt::Write as _;

use rand::prelude::*;

use crate::data::{RatingRecord, RelevanceRecord, binarize_rating};

/// Generate `n_rows` star ratings with a low-rank structure.
///
/// User ids are drawn from `1..=n_users` and movie ids from `1..=n_movies`. Each user has a
/// taste and each movie a quality and a style in `[-1, 1]`; the rating is
/// `3 + 1.2 * quality + taste * style` plus small noise, rounded to half stars in `[1, 5]`.
pub fn synthetic_ratings(
    n_users: u32,
    n_movies: u32,
    n_rows: usize,
    seed: u64,
) -> Vec<RatingRecord> {
    assert!(n_users > 0 && n_movies > 0);
    let mut rng = StdRng::seed_from_u64(seed);

    let taste: Vec<f32> = (0..n_users).map(|_| rng.r#gen::<f32>() * 2.0 - 1.0).collect();
    let quality: Vec<f32> = (0..n_movies).map(|_| rng.r#gen::<f32>() * 2.0 - 1.0).collect();
    let style: Vec<f32> = (0..n_movies).map(|_| rng.r#gen::<f32>() * 2.0 - 1.0).collect();

    (0..n_rows)
        .map(|_| {
            let u = rng.gen_range(0..n_users);
            let m = rng.gen_range(0..n_movies);
            let noise = (rng.r#gen::<f32>() * 2.0 - 1.0) * 0.25;
            let (ui, mi) = (u as usize, m as usize);
            let raw = 3.0 + 1.2 * quality[mi] + taste[ui] * style[mi] + noise;
            let label = ((raw * 2.0).round() / 2.0).clamp(1.0, 5.0);
            RatingRecord::new(u + 1, m + 1, label)
        })
        .collect()
}

/// Generate `n_rows` relevance records by binarizing [`synthetic_ratings`].
///
/// Ids are the decimal text of the numeric ids.
pub fn synthetic_relevance(
    n_users: u32,
    n_movies: u32,
    n_rows: usize,
    seed: u64,
) -> Vec<RelevanceRecord> {
    synthetic_ratings(n_users, n_movies, n_rows, seed)
        .into_iter()
        .map(|r| {
            RelevanceRecord::new(
                r.user_id.to_string(),
                r.movie_id.to_string(),
                binarize_rating(r.label) == 1,
            )
        })
        .collect()
}

/// Render ratings as a raw `userId,movieId,rating,timestamp` CSV.
///
/// Timestamps increase with the row index starting at `first_timestamp`.
pub fn ratings_csv(rows: &[RatingRecord], first_timestamp: i64) -> String {
    let mut out = String::from("userId,movieId,rating,timestamp\n");
    for (i, r) in rows.iter().enumerate() {
        // Writing to a String cannot fail.
        let timestamp = first_timestamp + i as i64;
        let _ = writeln!(out, "{},{},{},{timestamp}", r.user_id, r.movie_id, r.label);
    }
    out
}
