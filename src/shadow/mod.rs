//! Shadow collections
//!
//! Every versioned model keeps its history in a parallel collection named
//! `<Model><suffix>`, registered lazily on each connection the model is used
//! with.

mod accessor;
mod errors;

pub use accessor::ShadowAccessor;
pub use errors::{ShadowError, ShadowResult};
