//! crop-predict: top-3 class scoring for a pre-trained crop classifier.
//!
//! Loads a logistic regression artifact once at startup and serves
//! `POST /predict`, returning the three most probable class labels with
//! their probabilities for a 7-feature input.

pub mod config;
pub mod inference;
pub mod metrics;
pub mod server;
