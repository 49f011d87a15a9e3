//! Sanity checks of held-out evaluation against trained models.

use approx::assert_abs_diff_eq;

use movierec::testing::synthetic_ratings;
use movierec::{
    FieldAwareParams, FieldAwareTrainer, MatrixFactorizationParams, MatrixFactorizationTrainer,
    RatingRecord, Recommender, RelevanceRecord, Trainer,
};

fn mf_trainer() -> MatrixFactorizationTrainer {
    MatrixFactorizationTrainer::new(MatrixFactorizationParams {
        rank: 4,
        iterations: 60,
        ..Default::default()
    })
}

/// Rotate labels by half the set so every row is paired with another row's label.
fn permuted(rows: &[RatingRecord]) -> Vec<RatingRecord> {
    let shift = rows.len() / 2;
    rows.iter()
        .enumerate()
        .map(|(i, r)| {
            let label = rows[(i + shift) % rows.len()].label;
            RatingRecord::new(r.user_id, r.movie_id, label)
        })
        .collect()
}

#[test]
fn training_fit_beats_permuted_held_out_labels() {
    let data = synthetic_ratings(30, 25, 900, 17);
    let (train, test) = data.split_at(800);
    let model = mf_trainer().fit(train).unwrap();

    let train_rmse = model.evaluate(train).as_regression().unwrap().rmse;
    let permuted_rmse = model.evaluate(&permuted(test)).as_regression().unwrap().rmse;
    assert!(
        train_rmse <= permuted_rmse,
        "train RMSE {train_rmse} > permuted held-out RMSE {permuted_rmse}"
    );
}

#[test]
fn held_out_unknown_ids_still_evaluate() {
    let train = synthetic_ratings(10, 10, 200, 2);
    let model = mf_trainer().fit(&train).unwrap();
    let test = vec![RatingRecord::new(500, 1, 4.0), RatingRecord::new(1, 500, 2.0)];
    let metrics = model.evaluate(&test);
    let m = metrics.as_regression().unwrap();
    assert!(m.rmse.is_finite());
    assert!(m.mae <= m.rmse + 1e-12);
}

#[test]
fn empty_test_set_yields_neutral_metrics() {
    let model = mf_trainer().fit(&synthetic_ratings(5, 5, 30, 1)).unwrap();
    let m = *model.evaluate(&[]).as_regression().unwrap();
    assert_eq!(m.rmse, 0.0);
    assert_eq!(m.r_squared, 0.0);
}

#[test]
fn separable_relevance_is_classified_perfectly() {
    let mut rows = Vec::new();
    for u in 0..20 {
        for m in 0..5 {
            rows.push(RelevanceRecord::new(format!("{u}"), format!("a{m}"), true));
            rows.push(RelevanceRecord::new(format!("{u}"), format!("z{m}"), false));
        }
    }
    let model = FieldAwareTrainer::new(FieldAwareParams {
        latent_dim: 4,
        iterations: 20,
        n_buckets: 64,
        ..Default::default()
    })
    .fit(&rows)
    .unwrap();

    let metrics = model.evaluate(&rows);
    let m = metrics.as_classification().unwrap();
    assert_abs_diff_eq!(m.accuracy, 1.0);
    assert_abs_diff_eq!(m.auc, 1.0);
    assert_abs_diff_eq!(m.f1, 1.0);
    assert!(metrics.to_string().starts_with("Accuracy: 100.00%"));
}
