//! Model serving hooks
//!
//! [`InferenceHandler`] is the contract a hosting runtime drives per request:
//! load the model once, then parse, predict and serialize for each payload.

use std::path::Path;
use std::str::FromStr;

use crate::features::{parse_record, FeatureFrame, FeatureRecord};
use crate::model::{artifact, RandomForestRegressor};
use crate::{GradeError, Prediction, Result};

/// Media types the handler understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
}

impl FromStr for ContentType {
    type Err = GradeError;

    /// Exact match on the media type; parameters like `charset` are ignored
    fn from_str(raw: &str) -> Result<Self> {
        let media_type = raw.split(';').next().unwrap_or("").trim();
        if media_type == "application/json" {
            Ok(ContentType::Json)
        } else {
            Err(GradeError::UnsupportedContentType(raw.to_string()))
        }
    }
}

/// Load / parse / predict / serialize contract for a hosted model
pub trait InferenceHandler {
    type Model;
    type Input;
    type Output;

    /// Load the model from the directory the runtime provides
    fn load_model(&self, model_dir: &Path) -> Result<Self::Model>;

    /// Decode a request body declared as `content_type`
    fn parse_input(&self, body: &[u8], content_type: &str) -> Result<Self::Input>;

    fn predict(&self, input: &Self::Input, model: &Self::Model) -> Result<Self::Output>;

    /// Encode a response for the caller's `accept` type
    fn serialize_output(&self, output: &Self::Output, accept: &str) -> Result<Vec<u8>>;

    /// Full request path: parse, predict, serialize
    fn invoke(
        &self,
        model: &Self::Model,
        body: &[u8],
        content_type: &str,
        accept: &str,
    ) -> Result<Vec<u8>> {
        let input = self.parse_input(body, content_type)?;
        let output = self.predict(&input, model)?;
        self.serialize_output(&output, accept)
    }
}

/// Final grade handler backed by a random forest artifact
#[derive(Debug, Clone, Copy, Default)]
pub struct GradeHandler;

impl InferenceHandler for GradeHandler {
    type Model = RandomForestRegressor;
    type Input = FeatureFrame;
    type Output = Prediction;

    fn load_model(&self, model_dir: &Path) -> Result<RandomForestRegressor> {
        artifact::load(model_dir)
    }

    fn parse_input(&self, body: &[u8], content_type: &str) -> Result<FeatureFrame> {
        match content_type.parse::<ContentType>()? {
            ContentType::Json => {
                let value: serde_json::Value = serde_json::from_slice(body)
                    .map_err(|e| GradeError::MalformedPayload(e.to_string()))?;
                let record = parse_record(&value)?;
                Ok(FeatureFrame::from_records(&[record]))
            }
        }
    }

    fn predict(&self, input: &FeatureFrame, model: &RandomForestRegressor) -> Result<Prediction> {
        if input.n_columns() != model.n_features() {
            return Err(GradeError::FeatureMismatch {
                expected: model.n_features(),
                found: input.n_columns(),
            });
        }
        if let Some(expected) = model.feature_names() {
            let mismatch = expected
                .iter()
                .zip(input.columns())
                .enumerate()
                .find(|(_, (want, got))| want != got);
            if let Some((index, (want, got))) = mismatch {
                return Err(GradeError::FeatureNameMismatch {
                    index,
                    expected: want.clone(),
                    found: got.clone(),
                });
            }
        }
        model.predict(input.rows()).map(Prediction)
    }

    fn serialize_output(&self, output: &Prediction, accept: &str) -> Result<Vec<u8>> {
        let accepted = accept.trim().is_empty()
            || accept
                .split(',')
                .map(|t| t.split(';').next().unwrap_or("").trim())
                .any(|t| t == "*/*" || t == "application/*" || t.parse::<ContentType>().is_ok());
        if !accepted {
            return Err(GradeError::UnsupportedContentType(accept.to_string()));
        }

        serde_json::to_vec(output).map_err(|e| GradeError::Serialization(e.to_string()))
    }
}

/// A handler paired with its loaded model, ready to serve requests
pub struct Predictor<H: InferenceHandler = GradeHandler> {
    handler: H,
    model: H::Model,
}

impl<H: InferenceHandler> Predictor<H> {
    /// Load the model through the handler
    pub fn load(handler: H, model_dir: impl AsRef<Path>) -> Result<Self> {
        let model = handler.load_model(model_dir.as_ref())?;
        Ok(Predictor { handler, model })
    }

    pub fn with_model(handler: H, model: H::Model) -> Self {
        Predictor { handler, model }
    }

    /// Serve one request body
    pub fn invoke(&self, body: &[u8], content_type: &str, accept: &str) -> Result<Vec<u8>> {
        self.handler.invoke(&self.model, body, content_type, accept)
    }

    pub fn model(&self) -> &H::Model {
        &self.model
    }
}

impl Predictor<GradeHandler> {
    /// Predict the final grade for one record
    pub fn predict_record(&self, record: &FeatureRecord) -> Result<f64> {
        self.model.predict_row(&record.to_array())
    }
}
