//! Top-k selection over a class probability vector.

use serde::Serialize;

use crate::inference::classifier::{Classifier, ScoringError};

/// One entry of a ranked prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedClass {
    pub label: String,
    pub probability: f64,
}

/// Renders as a tuple literal, e.g. `('rice', 0.8123)`, which is the shape
/// existing clients parse out of the response strings.
impl std::fmt::Display for RankedClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {})",
            quote_label(&self.label),
            format_probability(self.probability)
        )
    }
}

/// Select the `k` most probable classes, highest first.
///
/// Equal probabilities rank the higher class index first, matching an
/// ascending stable argsort read back from the end.
pub fn top_k(classes: &[String], proba: &[f64], k: usize) -> Vec<RankedClass> {
    let mut order: Vec<usize> = (0..proba.len().min(classes.len())).collect();
    order.sort_by(|&a, &b| proba[b].total_cmp(&proba[a]).then(b.cmp(&a)));
    order
        .into_iter()
        .take(k)
        .map(|i| RankedClass {
            label: classes[i].clone(),
            probability: proba[i],
        })
        .collect()
}

/// Score one feature row and return its top-`k` ranking.
pub fn predict_top_k(
    model: &dyn Classifier,
    features: &[f64],
    k: usize,
) -> Result<Vec<RankedClass>, ScoringError> {
    let proba = model.predict_proba(features)?;
    let classes = model.classes();
    if proba.len() != classes.len() {
        return Err(ScoringError::Misaligned {
            expected: classes.len(),
            got: proba.len(),
        });
    }
    Ok(top_k(classes, &proba, k))
}

fn quote_label(label: &str) -> String {
    let quote = if label.contains('\'') && !label.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(label.len() + 2);
    out.push(quote);
    for c in label.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Shortest round-trip decimal, always with a fractional part.
fn format_probability(p: f64) -> String {
    let s = p.to_string();
    if p.is_finite() && !s.contains('.') {
        format!("{s}.0")
    } else {
        s
    }
}
