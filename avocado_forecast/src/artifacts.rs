//! Model artifact files of one training run
//!
//! A run exports four JSON resources into one directory: the fitted model,
//! the feature scaler, the target scaler and the ordered feature columns.

use crate::config::ArtifactConfig;
use crate::error::Result;
use crate::features::FeatureEngineer;
use crate::models::{ModelAdapter, ModelSpec};
use crate::scaler::{ScalerAdapter, ScalerSpec};
use crate::validation::validate_components;
use log::info;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Contents of `model.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub model: ModelSpec,
}

/// Contents of `scaler_x.json` or `scaler_y.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub scaler: ScalerSpec,
}

/// Contents of `feature_columns.json`, either a bare list or tagged with a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureColumnsFile {
    Plain(Vec<String>),
    Tagged {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        run_id: Option<String>,
        columns: Vec<String>,
    },
}

impl FeatureColumnsFile {
    pub fn columns(&self) -> &[String] {
        match self {
            FeatureColumnsFile::Tagged { columns, .. } => columns,
            FeatureColumnsFile::Plain(columns) => columns,
        }
    }

    pub fn run_id(&self) -> Option<&str> {
        match self {
            FeatureColumnsFile::Tagged { run_id, .. } => run_id.as_deref(),
            FeatureColumnsFile::Plain(_) => None,
        }
    }
}

/// Read one JSON resource
pub fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let file = File::open(path.as_ref())?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Loaded, cross-checked artifacts ready for inference
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    engineer: FeatureEngineer,
    scalers: ScalerAdapter,
    model: ModelAdapter,
    run_id: Option<String>,
}

impl ModelArtifacts {
    /// Load the four resources named by `config`
    pub fn load(config: &ArtifactConfig) -> Result<Self> {
        let model: ModelFile = read_json(config.model_path())?;
        let scaler_x: ScalerFile = read_json(config.scaler_x_path())?;
        let scaler_y: ScalerFile = read_json(config.scaler_y_path())?;
        let columns: FeatureColumnsFile = read_json(config.feature_columns_path())?;

        let artifacts = Self::from_parts(model, scaler_x, scaler_y, columns)?;
        info!(
            "Loaded {} with {} features from {}{}",
            artifacts.model_name(),
            artifacts.engineer.columns().len(),
            config.dir.display(),
            artifacts
                .run_id
                .as_deref()
                .map(|id| format!(" (run {})", id))
                .unwrap_or_default()
        );
        Ok(artifacts)
    }

    /// Assemble artifacts from already parsed resources
    ///
    /// The resources are validated together first; any inconsistency is
    /// returned as a [`ForecastError::Validation`] report.
    pub fn from_parts(
        model: ModelFile,
        scaler_x: ScalerFile,
        scaler_y: ScalerFile,
        columns: FeatureColumnsFile,
    ) -> Result<Self> {
        validate_components(Some(&model), Some(&scaler_x), Some(&scaler_y), Some(&columns))
            .into_result()?;

        let run_id = model
            .run_id
            .clone()
            .or_else(|| scaler_x.run_id.clone())
            .or_else(|| scaler_y.run_id.clone())
            .or_else(|| columns.run_id().map(str::to_string));

        Ok(Self {
            engineer: FeatureEngineer::new(columns.columns())?,
            scalers: ScalerAdapter::new(&scaler_x.scaler, &scaler_y.scaler)?,
            model: ModelAdapter::new(model.model.build()?),
            run_id,
        })
    }

    pub fn engineer(&self) -> &FeatureEngineer {
        &self.engineer
    }

    pub fn scalers(&self) -> &ScalerAdapter {
        &self.scalers
    }

    pub fn model(&self) -> &ModelAdapter {
        &self.model
    }

    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    /// Display name of the model backend
    pub fn model_name(&self) -> String {
        self.model
            .model()
            .map(|m| m.name().to_string())
            .unwrap_or_else(|| "none".to_string())
    }
}
