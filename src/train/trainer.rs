use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use crate::config::TrainingConfig;
use crate::error::{Error, Result};
use crate::features::encoding::{FeatureVector, FEATURE_COUNT};
use crate::model::admission::AdmissionModel;
use crate::network::network::Network;
use crate::preprocess::scaler::Scaler;
use crate::preprocess::split::train_test_split;
use crate::train::loop_fn::train_loop;
use crate::train::train_config::TrainConfig;

/// What the trainer hands to the evaluator: the fitted model and the held-out
/// partition, already scaled with the model's scaler.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub model: AdmissionModel,
    pub test_features: Vec<Vec<f64>>,
    pub test_labels: Vec<f64>,
}

/// Splits, scales and fits the admission classifier.
///
/// Everything random (split, weight init, shuffling) is drawn from one
/// `ChaCha8Rng` seeded with `config.seed`, so identical inputs give identical
/// weights and loss curves. Reaching `max_iter` without converging is only a
/// warning; the model is returned in whatever state the optimizer reached.
pub fn train_admission_model(
    features: &[FeatureVector],
    targets: &[f64],
    config: &TrainingConfig,
) -> Result<TrainOutcome> {
    validate_config(config)?;
    validate_data(features, targets)?;

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    let split = train_test_split(targets, config.test_ratio, &mut rng)?;
    let gather = |idx: &[usize]| -> (Vec<Vec<f64>>, Vec<f64>) {
        idx.iter().map(|&i| (features[i].to_vec(), targets[i])).unzip()
    };
    let (train_raw, train_y) = gather(&split.train);
    let (test_raw, test_y) = gather(&split.test);

    let scaler = Scaler::fit(config.scaler, &train_raw)?;
    let train_x = scaler.transform_all(&train_raw)?;
    let test_x = scaler.transform_all(&test_raw)?;

    let mut network = Network::binary_classifier(
        FEATURE_COUNT,
        &config.hidden_layers,
        &config.hidden_activation,
        &mut rng,
    );
    let mut optimizer = config.optimizer.build(config.learning_rate);

    let loop_config = TrainConfig {
        max_epochs: config.max_iter,
        batch_size: config.batch_size.min(train_x.len()),
        loss_type: config.loss,
        l2_penalty: config.alpha,
        tol: config.tol,
        n_iter_no_change: config.n_iter_no_change,
    };
    let train_labels: Vec<Vec<f64>> = train_y.iter().map(|&y| vec![y]).collect();

    info!(
        train_rows = train_x.len(),
        test_rows = test_x.len(),
        hidden = ?config.hidden_layers,
        optimizer = ?config.optimizer,
        "training admission classifier"
    );
    let report = train_loop(
        &mut network,
        &train_x,
        &train_labels,
        optimizer.as_mut(),
        &loop_config,
        &mut rng,
    )?;

    let loss_curve = report.loss_curve();
    let final_loss = loss_curve.last().copied().unwrap_or(f64::NAN);
    if report.converged {
        info!(iterations = loss_curve.len(), final_loss, "training converged");
    } else {
        warn!(
            max_iter = config.max_iter,
            final_loss,
            "maximum iterations reached without convergence; keeping the current weights"
        );
    }

    Ok(TrainOutcome {
        model: AdmissionModel::new(network, scaler, loss_curve, report.converged),
        test_features: test_x,
        test_labels: test_y,
    })
}

fn validate_config(config: &TrainingConfig) -> Result<()> {
    let bad = |msg: String| Err(Error::Training(msg));
    if config.hidden_layers.is_empty() || config.hidden_layers.contains(&0) {
        return bad(format!("hidden layer sizes must be positive, got {:?}", config.hidden_layers));
    }
    if config.batch_size == 0 || config.max_iter == 0 {
        return bad("batch_size and max_iter must be at least 1".into());
    }
    if !(config.learning_rate > 0.0 && config.learning_rate.is_finite()) {
        return bad(format!("learning rate must be positive, got {}", config.learning_rate));
    }
    if !(config.alpha >= 0.0) || !(config.tol >= 0.0) {
        return bad("alpha and tol must be non-negative".into());
    }
    Ok(())
}

fn validate_data(features: &[FeatureVector], targets: &[f64]) -> Result<()> {
    if features.is_empty() {
        return Err(Error::Training("no rows to train on".into()));
    }
    if features.len() != targets.len() {
        return Err(Error::Training(format!(
            "{} feature rows but {} targets",
            features.len(),
            targets.len()
        )));
    }
    if let Some(i) = features.iter().position(|f| f.as_slice().iter().any(|x| !x.is_finite())) {
        return Err(Error::Preprocessing(format!("row {} contains a non-finite feature", i)));
    }
    if let Some(i) = targets.iter().position(|&y| y != 0.0 && y != 1.0) {
        return Err(Error::Preprocessing(format!(
            "target {} at row {} is not binary",
            targets[i], i
        )));
    }
    let positives = targets.iter().filter(|&&y| y == 1.0).count();
    if positives == 0 || positives == targets.len() {
        return Err(Error::Training("targets contain a single class".into()));
    }
    Ok(())
}
