//! Identifier types shared across the workspace.

/// Identifier of a backing object.
pub type ObjectId = u64;

/// Identifier of a property on a backing object.
pub type PropertyId = u32;

/// Identifier of an object class.
pub type ClassId = u32;

/// Sentinel for "no object". Never allocated by a store.
pub const NULL_OBJECT: ObjectId = 0;
