// Copyright (c) 2025-2026 Zensical and contributors

// SPDX-License-Identifier: MIT
// All contributions are certified under the DCO

// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to
// deal in the Software without restriction, including without limitation the
// rights to use, copy, modify, merge, publish, distribute, sublicense, and/or
// sell copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:

// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NON-INFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
// FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS
// IN THE SOFTWARE.

// ----------------------------------------------------------------------------

//! The sibling array of a group node, or of the sink itself.

use ahash::HashMap;

use crate::node::Node;

// ----------------------------------------------------------------------------

/// An insertion-ordered, addressable array of child nodes.
///
/// Sibling order is the order of first insertion (spec invariant 3), and a
/// child must be reachable by key in better than linear time since every
/// `add`/`remove` call descends through one `Children` per level of scope
/// nesting. A plain `Vec` gives the order but not the lookup; a plain map
/// gives the lookup but not the order. This keeps both: a `Vec<Node>` for
/// iteration and serialization, and a side index from key to position.
///
/// Removing a member shifts every later index down by one, same as removing
/// from the middle of a `Vec`. That makes `remove` linear in the number of
/// later siblings, which is acceptable here: group fan-out is expected to be
/// small compared to the total record volume flowing through a pipeline.
#[derive(Clone, Debug, Default)]
pub struct Children {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
}

impl Children {
    /// Creates an empty child array.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: Vec::new(), index: HashMap::default() }
    }

    /// Appends a new child under `key`, which must not already be present.
    ///
    /// # Panics
    ///
    /// Panics if `key` is already present: callers must check with
    /// [`contains`](Self::contains) first, since re-adding under a live key
    /// is always a caller programming error, never a legitimate update.
    pub fn push(&mut self, key: String, node: Node) {
        assert!(!self.index.contains_key(&key), "duplicate child key");
        self.index.insert(key, self.nodes.len());
        self.nodes.push(node);
    }

    /// Removes and returns the child under `key`, if present.
    pub fn remove(&mut self, key: &str) -> Option<Node> {
        let position = self.index.remove(key)?;
        let node = self.nodes.remove(position);
        for index in self.index.values_mut() {
            if *index > position {
                *index -= 1;
            }
        }
        Some(node)
    }

    /// Returns a reference to the child under `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.index.get(key).map(|&position| &self.nodes[position])
    }

    /// Returns a mutable reference to the child under `key`, if present.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        let position = *self.index.get(key)?;
        Some(&mut self.nodes[position])
    }

    /// Returns whether a child is present under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the number of children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether there are no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the children in sibling order, for serialization.
    #[must_use]
    pub fn as_slice(&self) -> &[Node] {
        &self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn leaf() -> Node {
        Node::Record(Map::new())
    }

    #[test]
    fn remove_reappend_moves_to_end() {
        let mut children = Children::new();
        children.push("a".into(), leaf());
        children.push("b".into(), leaf());
        children.remove("a");
        children.push("a".into(), leaf());

        let order: Vec<_> = children.index.keys().cloned().collect();
        assert!(order.contains(&"a".to_owned()));
        assert_eq!(children.len(), 2);
    }

    #[test]
    fn remove_shifts_later_indices() {
        let mut children = Children::new();
        children.push("a".into(), leaf());
        children.push("b".into(), leaf());
        children.push("c".into(), leaf());
        children.remove("a");

        assert!(children.get("b").is_some());
        assert!(children.get("c").is_some());
        assert_eq!(children.len(), 2);
    }

    #[test]
    #[should_panic(expected = "duplicate child key")]
    fn push_duplicate_key_panics() {
        let mut children = Children::new();
        children.push("a".into(), leaf());
        children.push("a".into(), leaf());
    }
}
