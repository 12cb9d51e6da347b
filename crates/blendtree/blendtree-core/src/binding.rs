//! Named-value binding registry.
//!
//! A binding maps a user-chosen name to exactly one float parameter inside
//! some node (a clip timer or a blend weight), letting the host drive the
//! tree knowing only names. The table is a pure registry; write-through and
//! read-back happen on [`BlendTree`](crate::tree::BlendTree) because the
//! parameters live in the node arena and the clip bank.

use hashbrown::HashMap;

use crate::ids::NodeId;
use crate::node::BoundParameter;

/// One registered binding: the owning node plus the parameter class that
/// was resolved when the binding was made.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Binding {
    pub node: NodeId,
    pub parameter: BoundParameter,
}

/// Name → binding map. Names are unique; insertion is rejected upstream
/// when a name is already taken.
#[derive(Clone, Debug, Default)]
pub struct BindingTable {
    entries: HashMap<String, Binding>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.entries.get(name)
    }

    pub(crate) fn insert(&mut self, name: String, binding: Binding) {
        debug_assert!(!self.entries.contains_key(&name));
        self.entries.insert(name, binding);
    }

    /// Iterate bindings in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
