use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::features::encoding::{FeatureVector, ENCODING_VERSION, FEATURE_COUNT, FEATURE_NAMES};
use crate::network::network::Network;
use crate::preprocess::scaler::Scaler;

/// Probability at or above which an applicant is predicted eligible.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// The trained artifact: network, the scaler it was trained behind, and the
/// training loss history.
///
/// [`predict`](Self::predict) takes *raw* feature vectors and applies the
/// bundled scaler itself; [`predict_scaled`](Self::predict_scaled) is for rows
/// that already went through it, such as the held-out test partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionModel {
    pub encoding_version: u32,
    pub feature_names: Vec<String>,
    pub scaler: Scaler,
    pub network: Network,
    /// Mean training loss per epoch.
    pub loss_curve: Vec<f64>,
    pub converged: bool,
}

impl AdmissionModel {
    pub fn new(network: Network, scaler: Scaler, loss_curve: Vec<f64>, converged: bool) -> Self {
        AdmissionModel {
            encoding_version: ENCODING_VERSION,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            scaler,
            network,
            loss_curve,
            converged,
        }
    }

    /// Eligibility probability for an already-scaled row.
    pub fn predict_proba_scaled(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.network.input_size() {
            return Err(Error::Prediction(format!(
                "model expects {} features, got {}",
                self.network.input_size(),
                row.len()
            )));
        }
        let p = self.network.predict(row)
            .first()
            .copied()
            .ok_or_else(|| Error::Prediction("network produced no output".into()))?;
        if !p.is_finite() {
            return Err(Error::Prediction("network output is not finite".into()));
        }
        Ok(p)
    }

    /// 0 or 1 for an already-scaled row.
    pub fn predict_scaled(&self, row: &[f64]) -> Result<u8> {
        Ok(u8::from(self.predict_proba_scaled(row)? >= DECISION_THRESHOLD))
    }

    /// Eligibility probability for a raw feature vector.
    pub fn predict_proba(&self, features: &FeatureVector) -> Result<f64> {
        let scaled = self.scaler
            .transform(features.as_slice())
            .map_err(|e| Error::Prediction(e.to_string()))?;
        self.predict_proba_scaled(&scaled)
    }

    /// 0 or 1 for a raw feature vector.
    pub fn predict(&self, features: &FeatureVector) -> Result<u8> {
        Ok(u8::from(self.predict_proba(features)? >= DECISION_THRESHOLD))
    }

    /// Serializes the model to a pretty-printed JSON file, creating parent
    /// directories as needed.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let fail = |reason: String| Error::ModelSave { path: path.display().to_string(), reason };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| fail(e.to_string()))?;
        }
        let file = std::fs::File::create(path).map_err(|e| fail(e.to_string()))?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self).map_err(|e| fail(e.to_string()))
    }

    /// Deserializes a model written by `save_json` and checks it was trained
    /// on the current feature encoding.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<AdmissionModel> {
        let path = path.as_ref();
        let fail = |reason: String| Error::ModelLoad { path: path.display().to_string(), reason };

        let file = std::fs::File::open(path).map_err(|e| fail(e.to_string()))?;
        let reader = std::io::BufReader::new(file);
        let model: AdmissionModel = serde_json::from_reader(reader).map_err(|e| fail(e.to_string()))?;
        model.check_compatible().map_err(fail)?;
        Ok(model)
    }

    fn check_compatible(&self) -> std::result::Result<(), String> {
        if self.encoding_version != ENCODING_VERSION {
            return Err(format!(
                "model uses feature encoding v{}, this build uses v{}",
                self.encoding_version, ENCODING_VERSION
            ));
        }
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES.iter().copied()) {
            return Err("model feature columns differ from the current encoding".into());
        }
        if self.scaler.width() != FEATURE_COUNT || self.network.input_size() != FEATURE_COUNT {
            return Err(format!("model is not shaped for {} input features", FEATURE_COUNT));
        }
        if self.network.output_size() != 1 {
            return Err("model is not a binary classifier".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::features::encoding::{encode, Applicant, Research, UniversityRating};
    use crate::preprocess::scaler::ScalerKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn model() -> AdmissionModel {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let network = Network::binary_classifier(FEATURE_COUNT, &[4], &ActivationFunction::ReLU, &mut rng);
        let scaler = Scaler {
            kind: ScalerKind::Standard,
            offset: vec![310.0, 105.0, 3.0, 3.0, 8.5, 0.2, 0.2, 0.2, 0.2, 0.2, 0.5, 0.5],
            scale: vec![10.0, 6.0, 1.0, 1.0, 0.6, 0.4, 0.4, 0.4, 0.4, 0.4, 0.5, 0.5],
        };
        AdmissionModel::new(network, scaler, vec![0.71, 0.52, 0.1 + 0.2], true)
    }

    fn reference_vector() -> FeatureVector {
        encode(&Applicant {
            gre_score: 320.0,
            toefl_score: 110.0,
            sop: 4.5,
            lor: 4.0,
            cgpa: 9.0,
            university_rating: UniversityRating::Three,
            research: Research::Yes,
        })
    }

    #[test]
    fn raw_prediction_applies_the_scaler() {
        let m = model();
        let fv = reference_vector();
        let scaled = m.scaler.transform(fv.as_slice()).unwrap();
        assert_eq!(m.predict_proba(&fv).unwrap(), m.predict_proba_scaled(&scaled).unwrap());
        assert!(m.predict(&fv).unwrap() <= 1);
    }

    #[test]
    fn wrong_width_is_a_prediction_error() {
        let err = model().predict_scaled(&[0.0; 3]).unwrap_err();
        assert!(matches!(err, Error::Prediction(_)));
    }

    #[test]
    fn json_round_trip_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/model.json");
        let m = model();
        m.save_json(&path).unwrap();

        let back = AdmissionModel::load_json(&path).unwrap();
        assert_eq!(back.loss_curve, m.loss_curve);
        assert_eq!(back.scaler, m.scaler);
        for (a, b) in back.network.layers.iter().zip(m.network.layers.iter()) {
            assert_eq!(a.weights, b.weights);
            assert_eq!(a.biases, b.biases);
            assert_eq!(a.activator, b.activator);
        }
        let fv = reference_vector();
        assert_eq!(back.predict_proba(&fv).unwrap(), m.predict_proba(&fv).unwrap());
    }

    #[test]
    fn rejects_other_encoding_versions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let mut m = model();
        m.encoding_version = ENCODING_VERSION + 1;
        m.save_json(&path).unwrap();

        let err = AdmissionModel::load_json(&path).unwrap_err();
        assert!(matches!(err, Error::ModelLoad { .. }));
        assert!(err.to_string().contains("encoding"));
    }

    #[test]
    fn missing_or_corrupt_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AdmissionModel::load_json(dir.path().join("none.json")),
            Err(Error::ModelLoad { .. })
        ));
        let path = dir.path().join("bad.json");
        std::fs::write(&path, b"{ not json").unwrap();
        assert!(matches!(AdmissionModel::load_json(&path), Err(Error::ModelLoad { .. })));
    }
}
