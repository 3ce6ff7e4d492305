//! Paired model/vectorizer artifact files.
//!
//! A fitted transformer is useless without its paired classifier and vice
//! versa, so both artifacts are written and loaded as a pair, each carrying
//! the same training lineage. Loading verifies that the classifier's
//! feature width matches the vectorizer's vocabulary.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classifier::LogisticClassifier;
use crate::dataset::LabeledExample;
use crate::metrics::accuracy;
use crate::vectorizer::TfidfVectorizer;

/// Provenance recorded inside both artifact files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingLineage {
    /// Object-store key of the training artifact the bundle was fit on.
    pub trained_on: String,
    pub subset: f64,
    pub max_features: usize,
    /// Fingerprint of the resolved training request.
    pub fingerprint: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClassifierArtifact {
    lineage: TrainingLineage,
    classifier: LogisticClassifier,
}

#[derive(Debug, Serialize, Deserialize)]
struct VectorizerArtifact {
    lineage: TrainingLineage,
    vectorizer: TfidfVectorizer,
}

/// A loaded, width-checked classifier/vectorizer pair.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    pub classifier: LogisticClassifier,
    pub vectorizer: TfidfVectorizer,
    pub lineage: TrainingLineage,
}

/// Single-review prediction with class confidences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentimentPrediction {
    pub sentiment: String,
    pub confidence_positive: f64,
    pub confidence_negative: f64,
}

/// Errors raised while persisting or loading a bundle.
#[derive(Debug)]
pub enum BundleError {
    Io(std::io::Error),
    Json(serde_json::Error),
    IncompatiblePair {
        model_features: usize,
        vectorizer_features: usize,
    },
}

impl std::fmt::Display for BundleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BundleError::Io(error) => write!(f, "I/O error: {error}"),
            BundleError::Json(error) => write!(f, "JSON error: {error}"),
            BundleError::IncompatiblePair {
                model_features,
                vectorizer_features,
            } => write!(
                f,
                "model expects {model_features} features but vectorizer produces {vectorizer_features}"
            ),
        }
    }
}

impl std::error::Error for BundleError {}

impl From<std::io::Error> for BundleError {
    fn from(error: std::io::Error) -> Self {
        BundleError::Io(error)
    }
}

impl From<serde_json::Error> for BundleError {
    fn from(error: serde_json::Error) -> Self {
        BundleError::Json(error)
    }
}

/// Write the classifier and vectorizer artifact files.
pub fn save_bundle(
    classifier: &LogisticClassifier,
    vectorizer: &TfidfVectorizer,
    lineage: &TrainingLineage,
    model_path: &Path,
    vectorizer_path: &Path,
) -> Result<(), BundleError> {
    let model_file = BufWriter::new(File::create(model_path)?);
    serde_json::to_writer(
        model_file,
        &ClassifierArtifact {
            lineage: lineage.clone(),
            classifier: classifier.clone(),
        },
    )?;

    let vectorizer_file = BufWriter::new(File::create(vectorizer_path)?);
    serde_json::to_writer(
        vectorizer_file,
        &VectorizerArtifact {
            lineage: lineage.clone(),
            vectorizer: vectorizer.clone(),
        },
    )?;
    Ok(())
}

/// Load both artifact files and verify the pair is compatible.
pub fn load_bundle(model_path: &Path, vectorizer_path: &Path) -> Result<ModelBundle, BundleError> {
    let model_file = BufReader::new(File::open(model_path)?);
    let model_artifact: ClassifierArtifact = serde_json::from_reader(model_file)?;

    let vectorizer_file = BufReader::new(File::open(vectorizer_path)?);
    let vectorizer_artifact: VectorizerArtifact = serde_json::from_reader(vectorizer_file)?;

    let model_features = model_artifact.classifier.n_features();
    let vectorizer_features = vectorizer_artifact.vectorizer.n_features();
    if model_features != vectorizer_features {
        return Err(BundleError::IncompatiblePair {
            model_features,
            vectorizer_features,
        });
    }

    Ok(ModelBundle {
        classifier: model_artifact.classifier,
        vectorizer: vectorizer_artifact.vectorizer,
        lineage: model_artifact.lineage,
    })
}

impl ModelBundle {
    /// Predict the sentiment of a single review.
    pub fn predict(&self, review: &str) -> SentimentPrediction {
        let row = self.vectorizer.transform(review);
        let confidence_positive = self.classifier.predict_proba(&row);
        let sentiment = if confidence_positive >= 0.5 {
            "Positive"
        } else {
            "Negative"
        };
        SentimentPrediction {
            sentiment: sentiment.to_string(),
            confidence_positive,
            confidence_negative: 1.0 - confidence_positive,
        }
    }

    /// Score classification accuracy on labeled examples.
    pub fn accuracy_on(&self, examples: &[LabeledExample]) -> f64 {
        let predictions: Vec<u8> = examples
            .iter()
            .map(|example| {
                let row = self.vectorizer.transform(&example.review);
                self.classifier.predict(&row)
            })
            .collect();
        let targets: Vec<u8> = examples.iter().map(|example| example.sentiment).collect();
        accuracy(&predictions, &targets)
    }
}
