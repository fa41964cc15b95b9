// ============================================================
// Layer 4 — Feature Pipeline
// ============================================================
// A pipeline is an ordered list of stage descriptors:
//
//   OneHotIndex     { input, output }         categorical → one-hot
//   OneHotHashed    { input, output, bits }   categorical → hashed one-hot
//   Concatenate     { output, inputs }        vectors/numerics → one vector
//   NormalizeMinMax { column }                rescale a vector to [0, 1]
//
// PipelineSpec::fit walks the stages over the TRAINING rows,
// learning whatever each stage needs (vocabularies, min/max),
// and returns a FittedPipeline. FittedPipeline::transform then
// applies the learned stages to any dataset with the same
// schema, never refitting, so test categories can not leak
// into encoding indices.
//
// Every output slot carries a name ("Department-OHE.Sales",
// "Age", ...). Reports index features by slot, and look the
// name up here.
//
//   Employee row
//       │
//       ▼
//   Frame { numeric columns, categorical columns, derived vectors }
//       │  stage 1 … stage n
//       ▼
//   "Features" vector → FeatureMatrix row

use std::{borrow::Cow, collections::HashMap};

use serde::{Deserialize, Serialize};

use crate::data::encoder::{HashedEncoder, IndexVocabulary};
use crate::domain::{
    dataset::Dataset,
    employee::Employee,
    schema::{ColumnKind, Schema},
};
use crate::error::{AttritionError, Result};

pub const FEATURE_COLUMN: &str = "Features";

// ─── Stage descriptors ────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransformStage {
    OneHotIndex { input: String, output: String },
    OneHotHashed { input: String, output: String, bits: u32 },
    Concatenate { output: String, inputs: Vec<String> },
    NormalizeMinMax { column: String },
}

/// How categorical columns are turned into numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoricalEncoding {
    Index,
    Hashed { bits: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    stages: Vec<TransformStage>,
    feature_column: String,
}

impl PipelineSpec {
    pub fn new(stages: Vec<TransformStage>, feature_column: impl Into<String>) -> Self {
        Self { stages, feature_column: feature_column.into() }
    }

    /// One encoding stage per categorical column ("<Name>-OHE"), then
    /// numeric columns followed by the encoded columns concatenated into
    /// "Features", optionally min-max normalised.
    pub fn attrition(schema: &Schema, encoding: CategoricalEncoding, normalize: bool) -> Self {
        let categorical = schema.names_of(ColumnKind::Categorical);
        let mut stages = Vec::with_capacity(categorical.len() + 2);
        let mut inputs: Vec<String> = schema
            .names_of(ColumnKind::Numeric)
            .into_iter()
            .map(str::to_string)
            .collect();

        for name in categorical {
            let output = format!("{name}-OHE");
            stages.push(match encoding {
                CategoricalEncoding::Index => TransformStage::OneHotIndex {
                    input: name.to_string(),
                    output: output.clone(),
                },
                CategoricalEncoding::Hashed { bits } => TransformStage::OneHotHashed {
                    input: name.to_string(),
                    output: output.clone(),
                    bits,
                },
            });
            inputs.push(output);
        }

        stages.push(TransformStage::Concatenate {
            output: FEATURE_COLUMN.to_string(),
            inputs,
        });
        if normalize {
            stages.push(TransformStage::NormalizeMinMax {
                column: FEATURE_COLUMN.to_string(),
            });
        }

        Self::new(stages, FEATURE_COLUMN)
    }

    pub fn stages(&self) -> &[TransformStage] {
        &self.stages
    }

    pub fn feature_column(&self) -> &str {
        &self.feature_column
    }

    /// Learn every stage from `data`. Call once, on training data only.
    pub fn fit(&self, data: &Dataset) -> Result<FittedPipeline> {
        if data.is_empty() {
            return Err(AttritionError::InvalidArgument(
                "cannot fit a feature pipeline on an empty dataset".into(),
            ));
        }

        let schema = data.schema();
        let mut frames: Vec<Frame<'_>> = data.rows().iter().map(|r| Frame::new(schema, r)).collect();
        // slot names of every vector column produced so far
        let mut slots: HashMap<String, Vec<String>> = HashMap::new();
        let mut fitted = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let stage = match stage {
                TransformStage::OneHotIndex { input, output } => {
                    require_categorical(schema, input)?;
                    require_free(schema, &slots, output)?;
                    let vocab = IndexVocabulary::fit(
                        data.rows().iter().map(|r| r.categorical_value(schema, input).unwrap_or_default()),
                    );
                    slots.insert(
                        output.clone(),
                        vocab.categories().iter().map(|c| format!("{output}.{c}")).collect(),
                    );
                    tracing::debug!("{} → {}: {} categories", input, output, vocab.len());
                    FittedStage::OneHotIndex { input: input.clone(), output: output.clone(), vocab }
                }
                TransformStage::OneHotHashed { input, output, bits } => {
                    require_categorical(schema, input)?;
                    require_free(schema, &slots, output)?;
                    let encoder = HashedEncoder::fit(
                        *bits,
                        data.rows().iter().map(|r| r.categorical_value(schema, input).unwrap_or_default()),
                    )?;
                    slots.insert(
                        output.clone(),
                        encoder.slot_labels().iter().map(|c| format!("{output}.{c}")).collect(),
                    );
                    FittedStage::OneHotHashed { input: input.clone(), output: output.clone(), encoder }
                }
                TransformStage::Concatenate { output, inputs } => {
                    require_free(schema, &slots, output)?;
                    if inputs.is_empty() {
                        return Err(AttritionError::schema(format!(
                            "concatenation into '{output}' has no inputs"
                        )));
                    }
                    let mut names = Vec::new();
                    for input in inputs {
                        names.extend(vector_slot_names(schema, &slots, input)?);
                    }
                    slots.insert(output.clone(), names);
                    FittedStage::Concatenate { output: output.clone(), inputs: inputs.clone() }
                }
                TransformStage::NormalizeMinMax { column } => {
                    let width = slots
                        .get(column)
                        .map(Vec::len)
                        .ok_or_else(|| AttritionError::schema(format!(
                            "normalisation input '{column}' is not a vector column"
                        )))?;
                    let (offset, scale) = fit_min_max(&frames, column, width);
                    FittedStage::NormalizeMinMax { column: column.clone(), offset, scale }
                }
            };

            // later stages see this stage's output
            for frame in &mut frames {
                stage.apply(frame)?;
            }
            fitted.push(stage);
        }

        let slot_names = slots.remove(&self.feature_column).ok_or_else(|| {
            AttritionError::schema(format!(
                "pipeline never produces feature column '{}'",
                self.feature_column
            ))
        })?;

        tracing::info!(
            "Fitted feature pipeline: {} stages, {} feature slots",
            fitted.len(),
            slot_names.len()
        );

        Ok(FittedPipeline {
            schema: schema.clone(),
            stages: fitted,
            feature_column: self.feature_column.clone(),
            slot_names,
        })
    }
}

// ─── Fitted pipeline ──────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum FittedStage {
    OneHotIndex { input: String, output: String, vocab: IndexVocabulary },
    OneHotHashed { input: String, output: String, encoder: HashedEncoder },
    Concatenate { output: String, inputs: Vec<String> },
    NormalizeMinMax { column: String, offset: Vec<f32>, scale: Vec<f32> },
}

impl FittedStage {
    fn apply(&self, frame: &mut Frame<'_>) -> Result<()> {
        match self {
            FittedStage::OneHotIndex { input, output, vocab } => {
                let value = frame.categorical(input)?;
                let encoded = vocab.encode(value);
                frame.set(output, encoded);
            }
            FittedStage::OneHotHashed { input, output, encoder } => {
                let value = frame.categorical(input)?;
                let encoded = encoder.encode(value);
                frame.set(output, encoded);
            }
            FittedStage::Concatenate { output, inputs } => {
                let mut joined = Vec::new();
                for input in inputs {
                    joined.extend_from_slice(&frame.vector(input)?);
                }
                frame.set(output, joined);
            }
            FittedStage::NormalizeMinMax { column, offset, scale } => {
                let scaled: Vec<f32> = frame
                    .vector(column)?
                    .iter()
                    .zip(offset.iter().zip(scale))
                    .map(|(x, (lo, s))| (x - lo) * s)
                    .collect();
                frame.set(column, scaled);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPipeline {
    schema: Schema,
    stages: Vec<FittedStage>,
    feature_column: String,
    slot_names: Vec<String>,
}

impl FittedPipeline {
    /// Name of every slot of the feature vector, by slot index.
    pub fn slot_names(&self) -> &[String] {
        &self.slot_names
    }

    pub fn num_features(&self) -> usize {
        self.slot_names.len()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Feature vector for one row loaded against the fitted schema.
    pub fn transform_row(&self, row: &Employee) -> Result<Vec<f32>> {
        let mut frame = Frame::new(&self.schema, row);
        for stage in &self.stages {
            stage.apply(&mut frame)?;
        }
        let features = frame.vector(&self.feature_column)?.into_owned();
        if features.len() != self.slot_names.len() {
            return Err(AttritionError::schema_at(
                row.row_id(),
                format!("expected {} features, produced {}", self.slot_names.len(), features.len()),
            ));
        }
        Ok(features)
    }

    /// Apply the fitted stages to every row of `data`.
    pub fn transform(&self, data: &Dataset) -> Result<FeatureMatrix> {
        if data.schema() != &self.schema {
            return Err(AttritionError::schema(
                "dataset schema differs from the schema the pipeline was fitted on",
            ));
        }

        let width = self.num_features();
        let mut values = Vec::with_capacity(data.len() * width);
        for row in data.rows() {
            values.extend(self.transform_row(row)?);
        }

        Ok(FeatureMatrix {
            values,
            width,
            labels: data.labels(),
            row_ids: data.rows().iter().map(Employee::row_id).collect(),
            slot_names: self.slot_names.clone(),
        })
    }
}

// ─── Feature matrix ───────────────────────────────────────────────────────────
/// Dense row-major features with labels and slot names.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    values: Vec<f32>,
    width: usize,
    labels: Vec<bool>,
    row_ids: Vec<usize>,
    slot_names: Vec<String>,
}

impl FeatureMatrix {
    pub fn new(values: Vec<f32>, width: usize, labels: Vec<bool>, slot_names: Vec<String>) -> Result<Self> {
        if width != slot_names.len() || values.len() != width * labels.len() {
            return Err(AttritionError::InvalidArgument(format!(
                "feature matrix shape mismatch: {} values, width {}, {} labels, {} names",
                values.len(),
                width,
                labels.len(),
                slot_names.len()
            )));
        }
        let row_ids = (0..labels.len()).collect();
        Ok(Self { values, width, labels, row_ids, slot_names })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.values[i * self.width..(i + 1) * self.width]
    }

    pub fn labels(&self) -> &[bool] {
        &self.labels
    }

    pub fn row_ids(&self) -> &[usize] {
        &self.row_ids
    }

    pub fn slot_names(&self) -> &[String] {
        &self.slot_names
    }

    pub fn column(&self, j: usize) -> Vec<f32> {
        self.values.iter().skip(j).step_by(self.width).copied().collect()
    }

    /// Overwrite column `j` with `column` (one value per row).
    pub fn set_column(&mut self, j: usize, column: &[f32]) {
        for (i, v) in column.iter().enumerate() {
            self.values[i * self.width + j] = *v;
        }
    }
}

// ─── Per-row working state ────────────────────────────────────────────────────
struct Frame<'a> {
    schema: &'a Schema,
    row: &'a Employee,
    derived: Vec<(String, Vec<f32>)>,
}

impl<'a> Frame<'a> {
    fn new(schema: &'a Schema, row: &'a Employee) -> Self {
        Self { schema, row, derived: Vec::new() }
    }

    fn categorical(&self, name: &str) -> Result<&'a str> {
        self.row.categorical_value(self.schema, name).ok_or_else(|| {
            AttritionError::schema_at(self.row.row_id(), format!("no categorical value for '{name}'"))
        })
    }

    /// A derived vector, or a numeric column as a one-slot vector.
    fn vector(&self, name: &str) -> Result<Cow<'_, [f32]>> {
        if let Some((_, v)) = self.derived.iter().find(|(n, _)| n == name) {
            return Ok(Cow::Borrowed(v.as_slice()));
        }
        self.row
            .numeric_value(self.schema, name)
            .map(|x| Cow::Owned(vec![x]))
            .ok_or_else(|| {
                AttritionError::schema_at(self.row.row_id(), format!("no numeric column '{name}'"))
            })
    }

    fn set(&mut self, name: &str, values: Vec<f32>) {
        match self.derived.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = values,
            None => self.derived.push((name.to_string(), values)),
        }
    }
}

// ─── Fit-time validation ──────────────────────────────────────────────────────
fn require_categorical(schema: &Schema, name: &str) -> Result<()> {
    match schema.column(name).map(|c| c.kind) {
        Some(ColumnKind::Categorical) => Ok(()),
        Some(ColumnKind::Label) => Err(label_error(name)),
        Some(kind) => Err(AttritionError::schema(format!(
            "one-hot input '{name}' is {kind:?}, not categorical"
        ))),
        None => Err(AttritionError::schema(format!("unknown column '{name}'"))),
    }
}

fn require_free(schema: &Schema, slots: &HashMap<String, Vec<String>>, name: &str) -> Result<()> {
    if schema.column(name).is_some() || slots.contains_key(name) {
        return Err(AttritionError::schema(format!("output column '{name}' already exists")));
    }
    Ok(())
}

fn vector_slot_names(
    schema: &Schema,
    slots: &HashMap<String, Vec<String>>,
    name: &str,
) -> Result<Vec<String>> {
    if let Some(names) = slots.get(name) {
        return Ok(names.clone());
    }
    match schema.column(name).map(|c| c.kind) {
        Some(ColumnKind::Numeric) => Ok(vec![name.to_string()]),
        Some(ColumnKind::Label) => Err(label_error(name)),
        Some(ColumnKind::Categorical) => Err(AttritionError::schema(format!(
            "categorical column '{name}' must be encoded before concatenation"
        ))),
        Some(ColumnKind::Ignored) => Err(AttritionError::schema(format!(
            "column '{name}' is ignored by the schema"
        ))),
        None => Err(AttritionError::schema(format!("unknown column '{name}'"))),
    }
}

fn label_error(name: &str) -> AttritionError {
    AttritionError::schema(format!("label column '{name}' cannot be used as a feature"))
}

/// Per-slot (offset, scale) so that (x - offset) * scale maps the
/// training range onto [0, 1]. Constant slots get scale 0.
fn fit_min_max(frames: &[Frame<'_>], column: &str, width: usize) -> (Vec<f32>, Vec<f32>) {
    let mut lo = vec![f32::INFINITY; width];
    let mut hi = vec![f32::NEG_INFINITY; width];
    for frame in frames {
        if let Ok(v) = frame.vector(column) {
            for (j, x) in v.iter().enumerate().take(width) {
                lo[j] = lo[j].min(*x);
                hi[j] = hi[j].max(*x);
            }
        }
    }
    let scale = lo
        .iter()
        .zip(&hi)
        .map(|(l, h)| if h > l { 1.0 / (h - l) } else { 0.0 })
        .collect();
    let offset = lo.into_iter().map(|l| if l.is_finite() { l } else { 0.0 }).collect();
    (offset, scale)
}
