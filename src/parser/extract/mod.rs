pub mod classification;
pub mod score;
pub mod steps;

use serde::Serialize;

pub use classification::{extract_classification, Classification};
pub use score::extract_score;
pub use steps::{extract_steps, Step};

/// Difficulty facts pulled from an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScalarAssessment {
    pub score: Option<f64>,
    pub classification: Classification,
}

pub fn assess(text: &str) -> ScalarAssessment {
    let score = extract_score(text);
    ScalarAssessment {
        score,
        classification: extract_classification(text, score),
    }
}
