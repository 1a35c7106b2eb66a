//! Core configuration management types.

mod loader;
mod merge;
mod options;
mod schema;
mod snapshot;
mod store;
mod validation;
mod value;

pub(crate) use loader::ConfigLoader;
pub use merge::merge;
pub use options::LoadOptions;
pub use schema::{FieldSpec, Schema, ValueType};
pub use snapshot::ConfigSnapshot;
pub use store::ConfigStore;
pub use validation::{CustomCheck, coerce, validate};
pub use value::{ConfigValue, RawMapping};
