//! Boundary to the host model's parameter store.
//!
//! The physics engine never owns parameter values. It reads inputs from and
//! writes outputs to a [`ParameterStore`] implemented by the host; bindings
//! refer to parameters through a [`ParameterHandle`] that resolves its string
//! id to a store index lazily and caches the result.

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Named, ranged values owned by the host model.
///
/// Indices passed to the value accessors are always ones previously returned
/// by [`ParameterStore::parameter_index`].
pub trait ParameterStore {
    /// Number of parameter slots.
    fn parameter_count(&self) -> usize;

    /// Look up the slot of a parameter id.
    fn parameter_index(&self, id: &str) -> Option<usize>;

    /// Current value of a slot.
    fn value(&self, index: usize) -> f32;

    /// `(minimum, maximum)` of a slot.
    fn range(&self, index: usize) -> (f32, f32);

    /// Overwrite a slot's value.
    fn set_value(&mut self, index: usize, value: f32);

    /// Ask the host to recompute the pose synchronously before the next draw.
    fn request_pose_update(&mut self) {}
}

/// A parameter reference that resolves lazily.
///
/// Resolution is retried on each use until it succeeds once; after that the
/// index is cached for the binding's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterHandle {
    id: String,
    index: Option<usize>,
}

impl ParameterHandle {
    /// Create an unresolved handle.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            index: None,
        }
    }

    /// The parameter id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The cached index, if resolution has succeeded.
    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        self.index
    }

    /// Whether resolution has succeeded.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.index.is_some()
    }

    /// Resolve against `store` unless already resolved.
    pub fn resolve<S: ParameterStore + ?Sized>(&mut self, store: &S) -> Option<usize> {
        if self.index.is_none() {
            self.index = store.parameter_index(&self.id);
        }
        self.index
    }
}

/// One entry of a [`ParameterTable`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParameterEntry {
    /// Parameter id.
    pub id: String,
    /// Current value.
    pub value: f32,
    /// Lower bound.
    pub minimum: f32,
    /// Upper bound.
    pub maximum: f32,
    /// Authored default.
    pub default: f32,
}

/// A simple in-memory parameter store.
///
/// # Example
///
/// ```
/// use rig_types::{ParameterStore, ParameterTable};
///
/// let mut table = ParameterTable::new();
/// let angle_x = table.add("ParamAngleX", -30.0, 30.0, 0.0);
/// table.set_value(angle_x, 45.0);
///
/// // Writes are clamped into the declared range.
/// assert!((table.value(angle_x) - 30.0).abs() < 1e-6);
/// assert_eq!(table.parameter_index("ParamAngleX"), Some(angle_x));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParameterTable {
    entries: Vec<ParameterEntry>,
    lookup: HashMap<String, usize>,
    pose_update_requested: bool,
}

impl ParameterTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter at its default value, returning its slot.
    ///
    /// Adding an existing id redefines that slot in place.
    pub fn add(&mut self, id: impl Into<String>, minimum: f32, maximum: f32, default: f32) -> usize {
        let id = id.into();
        let entry = ParameterEntry {
            id: id.clone(),
            value: default,
            minimum,
            maximum,
            default,
        };

        if let Some(&index) = self.lookup.get(&id) {
            self.entries[index] = entry;
            return index;
        }

        let index = self.entries.len();
        self.entries.push(entry);
        self.lookup.insert(id, index);
        index
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for a parameter id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ParameterEntry> {
        self.lookup.get(id).and_then(|&i| self.entries.get(i))
    }

    /// Current value of a parameter id.
    #[must_use]
    pub fn value_of(&self, id: &str) -> Option<f32> {
        self.get(id).map(|e| e.value)
    }

    /// Set a parameter by id. Returns false if the id is unknown.
    pub fn set_value_of(&mut self, id: &str, value: f32) -> bool {
        match self.lookup.get(id).copied() {
            Some(index) => {
                self.set_value(index, value);
                true
            }
            None => false,
        }
    }

    /// Iterate over all entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &ParameterEntry> {
        self.entries.iter()
    }

    /// Return and clear the pending pose-update request.
    pub fn take_pose_update_request(&mut self) -> bool {
        std::mem::take(&mut self.pose_update_requested)
    }
}

impl ParameterStore for ParameterTable {
    fn parameter_count(&self) -> usize {
        self.entries.len()
    }

    fn parameter_index(&self, id: &str) -> Option<usize> {
        self.lookup.get(id).copied()
    }

    fn value(&self, index: usize) -> f32 {
        self.entries.get(index).map_or(0.0, |e| e.value)
    }

    fn range(&self, index: usize) -> (f32, f32) {
        self.entries
            .get(index)
            .map_or((0.0, 0.0), |e| (e.minimum, e.maximum))
    }

    fn set_value(&mut self, index: usize, value: f32) {
        if let Some(entry) = self.entries.get_mut(index) {
            let lo = entry.minimum.min(entry.maximum);
            let hi = entry.minimum.max(entry.maximum);
            entry.value = value.clamp(lo, hi);
        }
    }

    fn request_pose_update(&mut self) {
        self.pose_update_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn table() -> ParameterTable {
        let mut table = ParameterTable::new();
        table.add("ParamAngleX", -30.0, 30.0, 0.0);
        table.add("ParamHairFront", -1.0, 1.0, 0.0);
        table
    }

    #[test]
    fn test_add_and_lookup() {
        let table = table();
        assert_eq!(table.len(), 2);
        assert_eq!(table.parameter_index("ParamHairFront"), Some(1));
        assert_eq!(table.parameter_index("Missing"), None);
        assert_eq!(table.range(0), (-30.0, 30.0));
    }

    #[test]
    fn test_redefine_keeps_slot() {
        let mut table = table();
        let index = table.add("ParamAngleX", -90.0, 90.0, 10.0);
        assert_eq!(index, 0);
        assert_eq!(table.len(), 2);
        assert_relative_eq!(table.value(0), 10.0);
        assert_relative_eq!(table.get("ParamAngleX").map_or(f32::NAN, |e| e.default), 10.0);
    }

    #[test]
    fn test_set_value_clamps() {
        let mut table = table();
        table.set_value(1, 4.0);
        assert_relative_eq!(table.value(1), 1.0);
        assert!(table.set_value_of("ParamAngleX", -12.5));
        assert_relative_eq!(table.value_of("ParamAngleX").unwrap_or_default(), -12.5);
        assert!(!table.set_value_of("Missing", 1.0));
    }

    #[test]
    fn test_out_of_bounds_index_is_inert() {
        let mut table = table();
        table.set_value(99, 1.0);
        assert_relative_eq!(table.value(99), 0.0);
    }

    #[test]
    fn test_handle_resolves_lazily() {
        let mut table = ParameterTable::new();
        let mut handle = ParameterHandle::new("ParamBodyAngleX");

        assert_eq!(handle.resolve(&table), None);
        assert!(!handle.is_resolved());

        table.add("Other", 0.0, 1.0, 0.0);
        table.add("ParamBodyAngleX", -10.0, 10.0, 0.0);
        assert_eq!(handle.resolve(&table), Some(1));
        assert_eq!(handle.index(), Some(1));

        // Cached: a fresh table with a different layout is not consulted.
        let empty = ParameterTable::new();
        assert_eq!(handle.resolve(&empty), Some(1));
    }

    #[test]
    fn test_pose_update_request() {
        let mut table = table();
        assert!(!table.take_pose_update_request());
        table.request_pose_update();
        assert!(table.take_pose_update_request());
        assert!(!table.take_pose_update_request());
    }
}
