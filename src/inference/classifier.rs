//! Probability-scoring classifiers.
//!
//! The server only ever sees a [`Classifier`]: an immutable object that maps a
//! fixed-length feature vector to one probability per class label, with the
//! label list in the same index order as the probabilities.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while scoring a single feature vector.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("X has {got} features, but the model is expecting {expected} features as input")]
    FeatureCount { expected: usize, got: usize },

    #[error("expected an array of feature values, got {0}")]
    NotAnArray(&'static str),

    #[error("could not convert value at index {index} to float: {value}")]
    NotNumeric { index: usize, value: String },

    #[error("Input X contains {0}")]
    NonFinite(&'static str),

    #[error("model returned {got} probabilities for {expected} classes")]
    Misaligned { expected: usize, got: usize },
}

/// A loaded, read-only classification model.
pub trait Classifier: Send + Sync + std::fmt::Debug {
    /// Class labels, in probability-vector index order.
    fn classes(&self) -> &[String];

    /// Number of features expected per input row.
    fn n_features(&self) -> usize;

    /// Optional human-readable feature names, in input order.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Short identifier for the model family (e.g. "logistic_regression").
    fn model_type(&self) -> &str;

    /// Probability of every class for one feature row. Sums to 1.
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, ScoringError>;
}

/// How a logistic regression turns per-class decision values into probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiClass {
    /// Softmax over all decision values.
    #[default]
    Multinomial,
    /// Independent sigmoid per class, normalized to sum to 1.
    Ovr,
}

impl std::fmt::Display for MultiClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MultiClass::Multinomial => write!(f, "multinomial"),
            MultiClass::Ovr => write!(f, "ovr"),
        }
    }
}

/// Linear logistic regression exported from the training pipeline.
///
/// `coef` holds one row per class, except for binary models which carry a
/// single row scoring the second class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub multi_class: MultiClass,
    pub classes: Vec<String>,
    pub feature_names: Option<Vec<String>>,
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

impl LogisticRegression {
    /// Check that the parameter arrays agree with each other and with `classes`.
    pub fn validate(&self) -> Result<(), String> {
        let n_classes = self.classes.len();
        if n_classes < 2 {
            return Err(format!("need at least 2 classes, got {n_classes}"));
        }
        for (i, label) in self.classes.iter().enumerate() {
            if self.classes[..i].contains(label) {
                return Err(format!("duplicate class label {label:?}"));
            }
        }

        let expected_rows = if n_classes == 2 { 1 } else { n_classes };
        if self.coef.len() != expected_rows {
            return Err(format!(
                "coef has {} rows, expected {expected_rows} for {n_classes} classes",
                self.coef.len()
            ));
        }
        if self.intercept.len() != expected_rows {
            return Err(format!(
                "intercept has {} entries, expected {expected_rows}",
                self.intercept.len()
            ));
        }

        let n_features = self.coef[0].len();
        if n_features == 0 {
            return Err("coef rows are empty".to_string());
        }
        for (row_idx, row) in self.coef.iter().enumerate() {
            if row.len() != n_features {
                return Err(format!(
                    "coef row {row_idx} has {} values, expected {n_features}",
                    row.len()
                ));
            }
            if row.iter().any(|w| !w.is_finite()) {
                return Err(format!("coef row {row_idx} contains a non-finite weight"));
            }
        }
        if self.intercept.iter().any(|b| !b.is_finite()) {
            return Err("intercept contains a non-finite value".to_string());
        }

        if let Some(names) = &self.feature_names {
            if names.len() != n_features {
                return Err(format!(
                    "feature_names has {} entries, expected {n_features}",
                    names.len()
                ));
            }
        }
        Ok(())
    }

    /// Raw linear scores, one per coef row.
    pub fn decision_function(&self, features: &[f64]) -> Vec<f64> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect()
    }
}

impl Classifier for LogisticRegression {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn n_features(&self) -> usize {
        self.coef.first().map_or(0, Vec::len)
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn model_type(&self) -> &str {
        "logistic_regression"
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, ScoringError> {
        let expected = self.n_features();
        if features.len() != expected {
            return Err(ScoringError::FeatureCount {
                expected,
                got: features.len(),
            });
        }
        if features.iter().any(|x| x.is_nan()) {
            return Err(ScoringError::NonFinite("NaN"));
        }
        if features.iter().any(|x| x.is_infinite()) {
            return Err(ScoringError::NonFinite("infinity"));
        }

        let decision = self.decision_function(features);

        let proba = if decision.len() == 1 {
            // Binary: the single row scores classes[1].
            let d = decision[0];
            let p1 = match self.multi_class {
                MultiClass::Ovr => sigmoid(d),
                MultiClass::Multinomial => softmax(&[-d, d])[1],
            };
            vec![1.0 - p1, p1]
        } else {
            match self.multi_class {
                MultiClass::Multinomial => softmax(&decision),
                MultiClass::Ovr => {
                    let raw: Vec<f64> = decision.iter().copied().map(sigmoid).collect();
                    let total: f64 = raw.iter().sum();
                    raw.into_iter().map(|p| p / total).collect()
                }
            }
        };

        Ok(proba)
    }
}

/// Numerically stable logistic function.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Softmax with the max subtracted before exponentiation.
pub fn softmax(z: &[f64]) -> Vec<f64> {
    let max = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = z.iter().map(|v| (v - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn three_class(multi_class: MultiClass) -> LogisticRegression {
        LogisticRegression {
            multi_class,
            classes: labels(&["maize", "rice", "jute"]),
            feature_names: None,
            coef: vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, 0.0]],
            intercept: vec![0.0, 0.0, 0.0],
        }
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(&[1.0, 2.0, 3.0]);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(p[2] > p[1] && p[1] > p[0]);
    }

    #[test]
    fn test_softmax_large_values_stay_finite() {
        let p = softmax(&[1000.0, 1000.0]);
        assert_eq!(p, vec![0.5, 0.5]);
    }

    #[test]
    fn test_sigmoid_symmetry() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!((sigmoid(3.0) + sigmoid(-3.0) - 1.0).abs() < 1e-12);
        assert!(sigmoid(-800.0) >= 0.0);
        assert_eq!(sigmoid(800.0), 1.0);
    }

    #[test]
    fn test_multinomial_zero_input_is_uniform() {
        let model = three_class(MultiClass::Multinomial);
        let p = model.predict_proba(&[0.0, 0.0]).unwrap();
        for v in &p {
            assert!((v - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_multinomial_matches_manual_softmax() {
        let model = three_class(MultiClass::Multinomial);
        let p = model.predict_proba(&[2.0, 1.0]).unwrap();
        let e = [2.0f64.exp(), 1.0f64.exp(), 1.0];
        let total: f64 = e.iter().sum();
        for (got, want) in p.iter().zip(e.iter().map(|v| v / total)) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn test_ovr_normalizes_sigmoids() {
        let model = three_class(MultiClass::Ovr);
        // sigmoid(0) = 0.5 for every class.
        let p = model.predict_proba(&[0.0, 0.0]).unwrap();
        for v in &p {
            assert!((v - 1.0 / 3.0).abs() < 1e-12);
        }

        let p = model.predict_proba(&[4.0, -4.0]).unwrap();
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(p[0] > p[2] && p[2] > p[1]);
    }

    #[test]
    fn test_binary_single_row() {
        let model = LogisticRegression {
            multi_class: MultiClass::Ovr,
            classes: labels(&["no", "yes"]),
            feature_names: None,
            coef: vec![vec![1.0]],
            intercept: vec![0.0],
        };
        model.validate().unwrap();
        let p = model.predict_proba(&[2.0]).unwrap();
        assert!((p[1] - sigmoid(2.0)).abs() < 1e-12);
        assert!((p[0] + p[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_wrong_feature_count() {
        let model = three_class(MultiClass::Multinomial);
        let err = model.predict_proba(&[1.0]).unwrap_err();
        assert_eq!(err, ScoringError::FeatureCount { expected: 2, got: 1 });
    }

    #[test]
    fn test_nan_rejected() {
        let model = three_class(MultiClass::Multinomial);
        let err = model.predict_proba(&[f64::NAN, 1.0]).unwrap_err();
        assert_eq!(err.to_string(), "Input X contains NaN");
    }

    #[test]
    fn test_validate_catches_shape_mismatch() {
        let mut model = three_class(MultiClass::Multinomial);
        model.coef[1].push(0.5);
        assert!(model.validate().unwrap_err().contains("row 1"));

        let mut model = three_class(MultiClass::Multinomial);
        model.intercept.pop();
        assert!(model.validate().is_err());

        let mut model = three_class(MultiClass::Multinomial);
        model.classes[2] = "maize".to_string();
        assert!(model.validate().unwrap_err().contains("duplicate"));
    }
}
