//! Classifier loading and scoring.
//!
//! - [`classifier`]: The [`Classifier`](classifier::Classifier) trait and the logistic regression model
//! - [`model_loader`]: Artifact decoding and startup validation
//! - [`ranking`]: Top-k selection and response formatting of ranked classes

pub mod classifier;
pub mod model_loader;
pub mod ranking;
