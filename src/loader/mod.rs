//! JSON loaders that normalize atomic and modular ("super") documents
//! into the flat model and context shapes the engine consumes.
pub mod context;
pub mod error;
pub mod model;

pub use context::{load_context, normalize_context, SuperContextDocument};
pub use error::LoadError;
pub use model::{load_model, normalize_model, ModelModule, SuperModelDocument};
