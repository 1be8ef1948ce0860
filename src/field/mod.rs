//! Schema-driven field trees.
//!
//! ```text
//! merged Value ──build_fields──▶ Vec<Field> ──serialize_fields──▶ Mapping
//!                                   │  ▲
//!                       capture     │  │ set_value / set_force_include /
//!                                   ▼  │ add_array_item / remove_array_item
//!                             FieldSnapshot
//! ```
//!
//! Array-of-object fields keep one shared template in `fields`; realized
//! items are produced on demand by [`bind_item`].

mod builder;
mod model;
mod region;
mod serializer;
mod snapshot;
mod tracker;

pub use builder::{bind_item, build_fields, coerce_to};
pub use model::{Field, FieldType, ItemOverrides, find_field, label_for};
pub use region::FieldRegion;
pub use serializer::{OutputMode, SerializeOptions, serialize_fields};
pub use snapshot::FieldSnapshot;
pub use tracker::{
    FieldError, FieldStatus, add_array_item, field_statuses, is_modified, modified_paths,
    remove_array_item, resolve_field, set_force_include, set_value,
};
