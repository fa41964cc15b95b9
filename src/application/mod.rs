// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to accomplish one
// goal (training or evaluating a model).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1, through RunObserver)
//   - No direct file access (that's Layer 4 and 6)
//   - Only workflow coordination

// Progress reporting seam between use cases and the CLI
pub mod observer;

// The training workflow
pub mod train_use_case;

// Reload a saved model and score a CSV
pub mod evaluate_use_case;
