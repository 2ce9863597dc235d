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

//! The frozen pipeline: propagation of insert/retract events into the sink.

use ahash::HashMap;
use ivm_value::{Aggregate, Children, Fields, GroupNode, Node, RecordId};

use crate::error::{programming, Error};
use crate::op::{AggregateKind, Op};
use crate::plan::{plan, PlanStep};

/// A frozen, runnable pipeline.
///
/// Built once via [`crate::Builder::build`] and driven with [`Pipeline::add`]
/// and [`Pipeline::remove`]; there is no way to add or remove operators
/// after construction (spec invariant: "no dynamic rewiring at runtime").
pub struct Pipeline {
    ops: Vec<Op>,
    sink: Children,
    live: HashMap<RecordId, Fields>,
}

impl Pipeline {
    pub(crate) fn new(ops: Vec<Op>) -> Self {
        validate(&ops);
        Self { ops, sink: Children::new(), live: HashMap::default() }
    }

    /// Inserts a record under `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is already live: an identity may contribute to the
    /// engine's state at most once at a time.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, id, record)))]
    pub fn add(&mut self, id: impl Into<RecordId>, record: Fields) -> Result<(), Error> {
        let id = id.into();
        if self.live.contains_key(&id) {
            programming(format!("add: identity '{id}' is already live"));
        }
        if let Some(step) = plan(&self.ops, record.clone())? {
            apply_insert(&step, &mut self.sink, id.as_str());
        }
        self.live.insert(id, record);
        Ok(())
    }

    /// Retracts the record previously inserted under `id`.
    ///
    /// `record` must be the exact value passed to the matching [`add`](Self::add)
    /// call; the engine trusts this precondition rather than re-verifying it.
    ///
    /// # Panics
    ///
    /// Panics if `id` is unknown or was already retracted.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, id, record)))]
    pub fn remove(&mut self, id: impl Into<RecordId>, record: Fields) -> Result<(), Error> {
        let id = id.into();
        if !self.live.contains_key(&id) {
            programming(format!("remove: identity '{id}' is not live"));
        }
        let step = plan(&self.ops, record)?;
        self.live.remove(&id);
        if let Some(step) = step {
            apply_retract(&step, &mut self.sink, id.as_str());
        }
        Ok(())
    }

    /// Returns the current sink array.
    ///
    /// Borrowed and read-only, valid until the next [`add`](Self::add) or
    /// [`remove`](Self::remove) call. Callers needing a snapshot clone the
    /// slice's elements explicitly.
    #[must_use]
    pub fn output(&self) -> &[Node] {
        self.sink.as_slice()
    }
}

/// Applies a successful plan, creating group nodes as needed.
fn apply_insert(step: &PlanStep<'_>, siblings: &mut Children, leaf_key: &str) {
    match step {
        PlanStep::Leaf(fields) => {
            siblings.push(leaf_key.to_owned(), Node::Record(fields.clone()));
        }
        PlanStep::Enter { spec, group_key, key_fields, agg_inputs, next } => {
            if !siblings.contains(group_key) {
                let aggregates = spec
                    .aggregates()
                    .map(|aggregate| (aggregate.output.clone(), new_aggregate(&aggregate.kind)))
                    .collect();
                let node = GroupNode::new(key_fields.clone(), spec.child.clone(), aggregates);
                siblings.push(group_key.clone(), Node::Group(node));
            }
            let node = siblings
                .get_mut(group_key)
                .and_then(Node::as_group_mut)
                .expect("group node inserted above");
            for (aggregate, input) in spec.aggregates().zip(agg_inputs) {
                node.aggregate_mut(&aggregate.output)
                    .expect("aggregate declared on this group")
                    .insert(*input);
            }
            apply_insert(next, &mut node.children, leaf_key);
        }
    }
}

/// Applies a successful retract plan, destroying emptied group nodes.
fn apply_retract(step: &PlanStep<'_>, siblings: &mut Children, leaf_key: &str) {
    match step {
        PlanStep::Leaf(_) => {
            siblings.remove(leaf_key).expect("leaf present at retract");
        }
        PlanStep::Enter { spec, group_key, agg_inputs, next, .. } => {
            let node = siblings
                .get_mut(group_key)
                .and_then(Node::as_group_mut)
                .expect("group node present at retract");
            for (aggregate, input) in spec.aggregates().zip(agg_inputs) {
                node.aggregate_mut(&aggregate.output)
                    .expect("aggregate declared on this group")
                    .remove(*input);
            }
            apply_retract(next, &mut node.children, leaf_key);

            let emptied = siblings.get(group_key).and_then(Node::as_group).is_some_and(|g| g.children.is_empty());
            if emptied {
                siblings.remove(group_key);
            }
        }
    }
}

/// Builds the zeroed accumulator for a declared aggregate kind.
fn new_aggregate(kind: &AggregateKind) -> Aggregate {
    match kind {
        AggregateKind::Count => Aggregate::count(),
        AggregateKind::Sum(_) => Aggregate::sum(),
        AggregateKind::Avg(_) => Aggregate::avg(),
        AggregateKind::Min(_) => Aggregate::min(),
        AggregateKind::Max(_) => Aggregate::max(),
    }
}

/// Validates that no declared name uses the reserved `:` character.
fn validate(ops: &[Op]) {
    for op in ops {
        match op {
            Op::DefineProperty { name, .. } | Op::DropProperty { name } => check_name(name),
            Op::Filter { .. } => {}
            Op::Aggregate(spec) => check_name(&spec.output),
            Op::GroupBy(spec) => {
                check_name(&spec.child);
                for field in &spec.key_fields {
                    check_name(field);
                }
                // Aggregates live in `spec.nested` alongside the group's
                // other operators; the recursive call below already visits
                // them via the `Op::Aggregate` arm.
                validate(&spec.nested);
            }
        }
    }
}

fn check_name(name: &str) {
    if name.contains(':') {
        programming(format!("declared name '{name}' contains the reserved ':' character"));
    }
}

#[cfg(test)]
mod tests {
    use ivm_value::Value;
    use serde_json::json;

    use crate::Builder;

    fn fields(value: serde_json::Value) -> ivm_value::Fields {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn insert_then_retract_is_a_no_op() {
        let mut pipeline = Builder::new().build();
        let record = fields(json!({"a": 1}));
        pipeline.add("p1", record.clone()).unwrap();
        assert_eq!(pipeline.output().len(), 1);
        pipeline.remove("p1", record).unwrap();
        assert!(pipeline.output().is_empty());
    }

    #[test]
    fn filter_rejects_without_mutating_state() {
        let mut pipeline = Builder::new().filter(|r| Ok(r["a"].as_i64().unwrap_or(0) > 10)).build();
        pipeline.add("p1", fields(json!({"a": 1}))).unwrap();
        assert!(pipeline.output().is_empty());
    }

    #[test]
    fn caller_error_leaves_state_untouched() {
        let mut pipeline =
            Builder::new().filter(|_| Err::<bool, _>("boom".to_owned())).build();
        let result = pipeline.add("p1", fields(json!({"a": 1})));
        assert!(result.is_err());
        assert!(pipeline.output().is_empty());
    }

    #[test]
    fn caller_error_on_remove_leaves_live_set_untouched() {
        use std::cell::Cell;
        use std::rc::Rc;

        let fail = Rc::new(Cell::new(false));
        let fail_in_predicate = Rc::clone(&fail);
        let mut pipeline = Builder::new()
            .filter(move |_| if fail_in_predicate.get() { Err("boom".to_owned()) } else { Ok(true) })
            .build();

        pipeline.add("p1", fields(json!({}))).unwrap();
        assert_eq!(pipeline.output().len(), 1);

        fail.set(true);
        pipeline.remove("p1", fields(json!({}))).unwrap_err();
        assert_eq!(pipeline.output().len(), 1, "a failed retract must not mutate the sink");

        // "p1" must still be recognized as live: the failed remove above
        // must not have dropped it from tracking.
        fail.set(false);
        pipeline.remove("p1", fields(json!({}))).unwrap();
        assert!(pipeline.output().is_empty());
    }

    #[test]
    #[should_panic(expected = "already live")]
    fn duplicate_add_panics() {
        let mut pipeline = Builder::new().build();
        pipeline.add("p1", fields(json!({}))).unwrap();
        let _ = pipeline.add("p1", fields(json!({})));
    }

    #[test]
    #[should_panic(expected = "is not live")]
    fn remove_unknown_identity_panics() {
        let mut pipeline = Builder::new().build();
        let _ = pipeline.remove("ghost", fields(json!({})));
    }

    #[test]
    fn group_by_creates_and_destroys_on_membership() {
        let mut pipeline = Builder::new().group_by(&["category"], "items", |g| g.count("total")).build();
        pipeline.add("p1", fields(json!({"category": "E", "price": 500}))).unwrap();
        assert_eq!(pipeline.output().len(), 1);
        assert_eq!(pipeline.output()[0].to_json()["total"], Value::from(1));

        pipeline.remove("p1", fields(json!({"category": "E", "price": 500}))).unwrap();
        assert!(pipeline.output().is_empty());
    }

    #[test]
    fn reinsert_after_retract_reappends() {
        let mut pipeline = Builder::new().build();
        pipeline.add("a", fields(json!({}))).unwrap();
        pipeline.add("b", fields(json!({}))).unwrap();
        pipeline.remove("a", fields(json!({}))).unwrap();
        pipeline.add("a", fields(json!({}))).unwrap();

        // "a" was re-appended after "b", not restored to its original slot.
        assert_eq!(pipeline.output().len(), 2);
    }
}
