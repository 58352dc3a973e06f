// ============================================================
// Layer 5 — Endgame Classifier Pipeline
// ============================================================
// ColumnTransform → GradientBoostingClassifier, fitted together
// so the one-hot categories always come from the same rows as
// the trees.
//
//   fit(positions, labels):   transform.fit_transform → boost.fit
//   predict(positions):       transform.transform     → boost.predict
//
// Implements the Classifier trait so cross-validation can build
// a fresh, unfitted pipeline for every fold.

use crate::domain::endgame::EncodedPosition;
use crate::domain::error::{AnalysisError, AnalysisResult};
use crate::domain::traits::Classifier;
use crate::ml::boosting::{BoostingConfig, GradientBoostingClassifier};
use crate::ml::one_hot::ColumnTransform;

pub struct EndgameClassifier {
    transform: ColumnTransform,
    model: GradientBoostingClassifier,
    fitted: bool,
}

impl EndgameClassifier {
    pub fn new(config: BoostingConfig) -> Self {
        Self {
            transform: ColumnTransform::new(),
            model: GradientBoostingClassifier::new(config),
            fitted: false,
        }
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.transform.feature_names()
    }
}

impl Classifier<EncodedPosition> for EndgameClassifier {
    fn fit(&mut self, samples: &[EncodedPosition], labels: &[usize]) -> AnalysisResult<()> {
        let x = self.transform.fit_transform(samples)?;
        self.model.fit(&x, labels)?;
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, samples: &[EncodedPosition]) -> AnalysisResult<Vec<usize>> {
        if !self.fitted {
            return Err(AnalysisError::NotFitted("EndgameClassifier"));
        }
        let x = self.transform.transform(samples)?;
        self.model.predict(&x)
    }
}
