// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by several other layers:
//
//   session.rs     — Per-run context
//                    Seed, burn device and independent random
//                    streams, passed by reference into each
//                    stage instead of a global context.
//
//   model_store.rs — Model persistence
//                    Writes the fitted pipeline, classifier,
//                    manifest and run config into one zip and
//                    reads them back for evaluation.
//
//   metrics.rs     — Run log
//                    Appends per-epoch training loss and final
//                    evaluation metrics to CSV files next to
//                    the model.

/// Seed, device and random streams for one run
pub mod session;

/// Zip persistence for trained models
pub mod model_store;

/// Training and evaluation CSV logger
pub mod metrics;
