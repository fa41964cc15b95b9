// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the raw CSV file to tensor batches:
//
//   attrition.csv
//       │
//       ▼
//   CsvLoader         → typed Employee rows (Dataset)
//       │
//       ▼
//   split_train_test  → train / test Datasets
//       │
//       ▼
//   PipelineSpec      → fit on train → FittedPipeline
//       │
//       ▼
//   FeatureMatrix     → dense "Features" vectors + labels
//       │
//       ▼
//   FeatureDataset    → burn Dataset trait
//       │
//       ▼
//   FeatureBatcher    → tensor batches for the training loop

/// Reads delimited text into Employee rows
pub mod loader;

/// Shuffles and splits rows into train/test sets
pub mod splitter;

/// One-hot index and hashed encoders
pub mod encoder;

/// Stage descriptors, fit/transform interpreter, FeatureMatrix
pub mod pipeline;

/// Implements burn's Dataset trait over encoded rows
pub mod dataset;

/// Implements burn's Batcher trait to create tensor batches
pub mod batcher;
