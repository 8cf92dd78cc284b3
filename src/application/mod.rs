// Application layer: use cases over the repository.
// Validation happens here so the aggregation engine only ever sees
// well-formed records.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
