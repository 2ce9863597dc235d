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

//! The two kinds of node that make up the sink tree.

use crate::aggregate::Aggregate;
use crate::children::Children;
use crate::fields::{Fields, Value};

// ----------------------------------------------------------------------------
// GroupNode
// ----------------------------------------------------------------------------

/// A single group in the sink tree.
///
/// A group node owns its key fields, the name of the array its children are
/// published under, the children themselves, and the running state of every
/// aggregate declared on this grouping level. Aggregates live here rather
/// than in a table keyed by scope path: a node's aggregates are never shared
/// with any other node, so attaching them directly means they're dropped for
/// free when the node is destroyed.
#[derive(Clone, Debug)]
pub struct GroupNode {
    /// The group's own key fields, plus any fields copied through unrelated
    /// to grouping (`defineProperty` applied above this scope).
    pub fields: Fields,
    /// Name of the array field children are published under.
    pub child: String,
    /// This group's children, in first-insertion order.
    pub children: Children,
    aggregates: Vec<(String, Aggregate)>,
}

impl GroupNode {
    /// Creates a new, empty group node.
    ///
    /// `aggregates` pairs each declared aggregate's output field name with a
    /// zeroed accumulator of the right kind.
    #[must_use]
    pub fn new(fields: Fields, child: String, aggregates: Vec<(String, Aggregate)>) -> Self {
        Self { fields, child, children: Children::new(), aggregates }
    }

    /// Returns a mutable reference to a declared aggregate by output name.
    pub fn aggregate_mut(&mut self, name: &str) -> Option<&mut Aggregate> {
        self.aggregates.iter_mut().find(|(n, _)| n == name).map(|(_, a)| a)
    }

    /// Iterates the declared aggregates with their output field names.
    pub fn aggregates(&self) -> impl Iterator<Item = (&str, &Aggregate)> {
        self.aggregates.iter().map(|(name, aggregate)| (name.as_str(), aggregate))
    }

    /// Renders this group node (including its subtree) to its JSON shape.
    ///
    /// The result is the key fields, merged with the current value of every
    /// declared aggregate, plus the child array under `child`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = self.fields.clone();
        for (name, aggregate) in self.aggregates() {
            object.insert(name.to_owned(), aggregate.value());
        }
        let children = self.children.as_slice().iter().map(Node::to_json).collect();
        object.insert(self.child.clone(), Value::Array(children));
        Value::Object(object)
    }
}

// ----------------------------------------------------------------------------
// Node
// ----------------------------------------------------------------------------

/// A member of a [`Children`] array: either a leaf record or a nested group.
#[derive(Clone, Debug)]
pub enum Node {
    /// A surviving record, stripped of every field consumed by an ancestor
    /// `groupBy` along its scope path.
    Record(Fields),
    /// A group of records sharing a common key at this level of nesting.
    Group(GroupNode),
}

impl Node {
    /// Renders this node to its output JSON shape.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Record(fields) => Value::Object(fields.clone()),
            Self::Group(group) => group.to_json(),
        }
    }

    /// Returns this node as a group node, if it is one.
    #[must_use]
    pub fn as_group(&self) -> Option<&GroupNode> {
        match self {
            Self::Group(group) => Some(group),
            Self::Record(_) => None,
        }
    }

    /// Returns this node as a mutable group node, if it is one.
    pub fn as_group_mut(&mut self) -> Option<&mut GroupNode> {
        match self {
            Self::Group(group) => Some(group),
            Self::Record(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn group_renders_fields_aggregates_and_children() {
        let mut group = GroupNode::new(
            Fields::from_iter([("state".to_owned(), json!("NY"))]),
            "cities".to_owned(),
            vec![("count".to_owned(), Aggregate::count())],
        );
        group.aggregate_mut("count").unwrap().insert(None);
        group.children.push("Albany".to_owned(), Node::Record(Fields::new()));

        let rendered = group.to_json();
        assert_eq!(rendered["state"], json!("NY"));
        assert_eq!(rendered["count"], json!(1));
        assert_eq!(rendered["cities"].as_array().unwrap().len(), 1);
    }
}
