// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types describing what the system works on:
// the column schema, one Employee row, a Dataset of rows,
// and the traits the outer layers implement.
//
// Rules for this layer:
//   - NO burn types
//   - NO file I/O
//   - Only plain structs, enums and traits

// Column names and their semantic roles
pub mod schema;

// One immutable source row
pub mod employee;

// Ordered rows + the schema they were loaded with
pub mod dataset;

// Abstractions implemented by the data and ml layers
pub mod traits;
