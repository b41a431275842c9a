use tracing::info;

use crate::error::{Error, Result};
use crate::evaluate::confusion::ConfusionMatrix;
use crate::model::admission::AdmissionModel;

/// Held-out performance of a trained model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// `(tn + tp) / total`.
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
}

/// Scores `model` on rows that were already scaled with the model's scaler.
///
/// Labels must be 0 or 1; a mismatched or empty partition is an
/// `Error::Evaluation`.
pub fn evaluate_model(model: &AdmissionModel, features: &[Vec<f64>], labels: &[f64]) -> Result<Evaluation> {
    if features.is_empty() {
        return Err(Error::Evaluation("test partition is empty".into()));
    }
    if features.len() != labels.len() {
        return Err(Error::Evaluation(format!(
            "{} test rows but {} labels",
            features.len(),
            labels.len()
        )));
    }

    let mut confusion = ConfusionMatrix::default();
    for (i, (row, &label)) in features.iter().zip(labels).enumerate() {
        let truth = match label {
            l if l == 0.0 => 0,
            l if l == 1.0 => 1,
            other => {
                return Err(Error::Evaluation(format!("label {} at row {} is not binary", other, i)));
            }
        };
        let predicted = model
            .predict_scaled(row)
            .map_err(|e| Error::Evaluation(format!("row {}: {}", i, e)))?;
        confusion.record(truth, predicted);
    }

    let evaluation = Evaluation { accuracy: confusion.accuracy(), confusion };
    info!(
        accuracy = evaluation.accuracy,
        tn = confusion.tn,
        fp = confusion.fp,
        fn_ = confusion.fn_,
        tp = confusion.tp,
        precision = confusion.precision(),
        recall = confusion.recall(),
        f1 = confusion.f1(),
        "evaluation finished"
    );
    Ok(evaluation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::features::encoding::FEATURE_COUNT;
    use crate::math::matrix::Matrix;
    use crate::network::network::Network;
    use crate::preprocess::scaler::{Scaler, ScalerKind};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Predicts 1 exactly when the first (scaled) feature is positive.
    fn sign_model() -> AdmissionModel {
        let mut net = Network::binary_classifier(FEATURE_COUNT, &[1], &ActivationFunction::Identity, &mut ChaCha8Rng::seed_from_u64(0));
        let mut w = vec![vec![0.0]; FEATURE_COUNT];
        w[0][0] = 1.0;
        net.layers[0].weights = Matrix::from_data(w);
        net.layers[1].weights = Matrix::from_data(vec![vec![50.0]]);
        let scaler = Scaler {
            kind: ScalerKind::Standard,
            offset: vec![0.0; FEATURE_COUNT],
            scale: vec![1.0; FEATURE_COUNT],
        };
        AdmissionModel::new(net, scaler, vec![0.5], true)
    }

    fn row(x: f64) -> Vec<f64> {
        let mut r = vec![0.0; FEATURE_COUNT];
        r[0] = x;
        r
    }

    #[test]
    fn counts_and_accuracy_agree() {
        let model = sign_model();
        let features = vec![row(1.0), row(2.0), row(-1.0), row(-3.0), row(0.5), row(-0.5)];
        let labels = vec![1.0, 1.0, 0.0, 1.0, 0.0, 0.0];

        let eval = evaluate_model(&model, &features, &labels).unwrap();
        assert_eq!(eval.confusion.as_rows(), [[2, 1], [1, 2]]);
        assert_eq!(eval.confusion.total(), features.len());
        assert_eq!(eval.accuracy, eval.confusion.correct() as f64 / features.len() as f64);
    }

    #[test]
    fn perfect_separation() {
        let model = sign_model();
        let features = vec![row(1.0), row(-1.0)];
        let eval = evaluate_model(&model, &features, &[1.0, 0.0]).unwrap();
        assert_eq!(eval.accuracy, 1.0);
    }

    #[test]
    fn rejects_empty_mismatched_and_non_binary() {
        let model = sign_model();
        assert!(matches!(evaluate_model(&model, &[], &[]), Err(Error::Evaluation(_))));
        assert!(matches!(evaluate_model(&model, &[row(1.0)], &[]), Err(Error::Evaluation(_))));
        assert!(matches!(evaluate_model(&model, &[row(1.0)], &[0.7]), Err(Error::Evaluation(_))));
        assert!(matches!(evaluate_model(&model, &[vec![1.0]], &[1.0]), Err(Error::Evaluation(_))));
    }
}
