//! End-to-end runs over CSV files on disk.

use std::path::Path;

use movierec::data::load_records;
use movierec::testing::{ratings_csv, synthetic_ratings};
use movierec::{
    Algorithm, DatasetSplitter, MatrixFactorizationParams, MatrixFactorizationTrainer, Model,
    Pipeline, PipelineConfig, Prediction, RatingRecord, Recommender, RelevanceRecord, Trainer,
};

fn write_ratings(dir: &Path, n_rows: usize) -> std::path::PathBuf {
    let path = dir.join("ratings.csv");
    std::fs::write(&path, ratings_csv(&synthetic_ratings(20, 15, n_rows, 5), 964_982_703)).unwrap();
    path
}

#[test]
fn toy_preferences_are_learned() {
    let train = [
        RatingRecord::new(1, 10, 5.0),
        RatingRecord::new(1, 20, 1.0),
        RatingRecord::new(2, 10, 4.0),
        RatingRecord::new(2, 20, 2.0),
    ];
    let model = MatrixFactorizationTrainer::new(MatrixFactorizationParams {
        rank: 1,
        iterations: 50,
        ..Default::default()
    })
    .fit(&train)
    .unwrap();

    let score = model.predict(&1, &10).score;
    assert!((score - 5.0).abs() < (score - 1.0).abs(), "score = {score}");
}

#[test]
fn split_files_load_as_records() {
    let dir = tempfile::tempdir().unwrap();
    let ratings = write_ratings(dir.path(), 100);
    let train_path = dir.path().join("train.csv");
    let test_path = dir.path().join("test.csv");

    let summary = DatasetSplitter::new(0.9)
        .unwrap()
        .with_binarize(true)
        .split_file(&ratings, &train_path, &test_path)
        .unwrap();
    assert_eq!((summary.train_rows, summary.test_rows), (90, 10));

    let train: Vec<RelevanceRecord> = load_records(&train_path).unwrap();
    let test: Vec<RelevanceRecord> = load_records(&test_path).unwrap();
    assert_eq!(train.len(), 90);
    assert_eq!(test.len(), 10);

    // Binarized labels read back as 0/1 ratings.
    let as_ratings: Vec<RatingRecord> = load_records(&train_path).unwrap();
    assert!(as_ratings.iter().all(|r| r.label == 0.0 || r.label == 1.0));
}

#[test]
fn json_configured_run_saves_a_reloadable_model() {
    let dir = tempfile::tempdir().unwrap();
    let ratings = write_ratings(dir.path(), 300);
    let model_path = dir.path().join("model.mrec");

    let json = serde_json::json!({
        "ratings_path": ratings,
        "train_path": dir.path().join("ratings-train.csv"),
        "test_path": dir.path().join("ratings-test.csv"),
        "model_path": model_path,
        "algorithm": "matrix_factorization",
        "rank": 4,
        "iterations": 15,
        "seed": 42,
        "verbosity": "silent",
        "probe": { "user": "6", "movie": "10" }
    });
    let config_path = dir.path().join("pipeline.json");
    std::fs::write(&config_path, json.to_string()).unwrap();

    let config = PipelineConfig::from_json_file(&config_path).unwrap();
    let report = Pipeline::new(config).run().unwrap();

    assert_eq!(report.algorithm, Algorithm::MatrixFactorization);
    assert_eq!(report.split.total_rows, 300);
    assert_eq!((report.split.train_rows, report.split.test_rows), (270, 30));
    assert!(report.metrics.as_regression().unwrap().rmse.is_finite());

    let reloaded = Model::load(&model_path).unwrap();
    assert_eq!(reloaded.predict_raw("6", "10").unwrap(), report.prediction);
}

#[test]
fn field_aware_run_reports_relevance() {
    let dir = tempfile::tempdir().unwrap();
    let ratings = write_ratings(dir.path(), 200);

    let config = PipelineConfig::builder()
        .ratings_path(ratings)
        .train_path(dir.path().join("train.csv"))
        .test_path(dir.path().join("test.csv"))
        .model_path(dir.path().join("ffm.mrec"))
        .algorithm(Algorithm::FieldAware)
        .rank(4)
        .iterations(3)
        .seed(7)
        .build()
        .unwrap();
    let report = Pipeline::new(config).run().unwrap();

    assert_eq!(report.probe.user, "6");
    assert_eq!(report.probe.movie, "15");
    let Prediction::Relevance(p) = report.prediction else {
        panic!("expected a relevance prediction, got {:?}", report.prediction);
    };
    assert!(p.score > 0.0 && p.score < 100.0);
    assert_eq!(p.label, p.logit > 0.0);
    let m = report.metrics.as_classification().unwrap();
    assert!((0.0..=1.0).contains(&m.accuracy));
}

#[test]
fn malformed_ratings_abort_before_training() {
    let dir = tempfile::tempdir().unwrap();
    let ratings = dir.path().join("ratings.csv");
    std::fs::write(&ratings, "userId,movieId,rating,timestamp\n1,2,4,10\n1,3,five,11\n").unwrap();
    let model_path = dir.path().join("model.mrec");

    let config = PipelineConfig::builder()
        .ratings_path(ratings)
        .train_path(dir.path().join("train.csv"))
        .test_path(dir.path().join("test.csv"))
        .model_path(&model_path)
        .seed(1)
        .build()
        .unwrap();
    assert!(matches!(Pipeline::new(config).run(), Err(movierec::Error::Parse(_))));
    assert!(!model_path.exists());
}
