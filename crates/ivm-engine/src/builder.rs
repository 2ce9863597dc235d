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

//! A structurally-nested pipeline declaration.
//!
//! The nesting here is deliberate: a `groupBy` that should wrap another
//! `groupBy`'s output is expressed by nesting the inner call inside the
//! outer one's `configure` closure, so the declaration's shape already
//! mirrors the shape of the tree it produces.

use ivm_value::{Fields, Value};

use crate::op::{AggregateKind, AggregateSpec, ComputeFn, GroupSpec, Op, PredicateFn};
use crate::pipeline::Pipeline;

/// Declares a pipeline's root-level operators.
#[derive(Default)]
pub struct Builder {
    ops: Vec<Op>,
}

impl Builder {
    /// Starts an empty declaration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a derived scalar into every record, computed by `compute`.
    #[must_use]
    pub fn define_property(
        mut self,
        name: impl Into<String>,
        compute: impl Fn(&Fields) -> Result<Value, String> + 'static,
    ) -> Self {
        self.ops.push(define_property(name, compute));
        self
    }

    /// Projects away `name` from every record.
    #[must_use]
    pub fn drop_property(mut self, name: impl Into<String>) -> Self {
        self.ops.push(drop_property(name));
        self
    }

    /// Retains only records for which `predicate` returns `true`.
    #[must_use]
    pub fn filter(mut self, predicate: impl Fn(&Fields) -> Result<bool, String> + 'static) -> Self {
        self.ops.push(filter(predicate));
        self
    }

    /// Groups records by `key_fields`, publishing members under `child`.
    ///
    /// `configure` declares the operators and aggregates that apply to this
    /// group's members - the equivalent of `in(child)` in a flat builder.
    #[must_use]
    pub fn group_by(
        mut self,
        key_fields: &[&str],
        child: impl Into<String>,
        configure: impl FnOnce(Group) -> Group,
    ) -> Self {
        self.ops.push(group_by(key_fields, child, configure));
        self
    }

    /// Freezes the declaration into a runnable [`Pipeline`].
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline::new(self.ops)
    }
}

/// Declares the operators and aggregates nested inside one `groupBy`.
///
/// Operators and aggregates share a single sequence: `count`/`sum`/`avg`/
/// `min`/`max` push an [`Op::Aggregate`] at the call's position, same as
/// `define_property`/`drop_property`/`filter` push their own op, so a
/// `define_property` declared before an aggregate is visible to it.
#[derive(Default)]
pub struct Group {
    nested: Vec<Op>,
}

impl Group {
    fn new() -> Self {
        Self::default()
    }

    /// Merges a derived scalar into every member, computed by `compute`.
    #[must_use]
    pub fn define_property(
        mut self,
        name: impl Into<String>,
        compute: impl Fn(&Fields) -> Result<Value, String> + 'static,
    ) -> Self {
        self.nested.push(define_property(name, compute));
        self
    }

    /// Projects away `name` from every member.
    #[must_use]
    pub fn drop_property(mut self, name: impl Into<String>) -> Self {
        self.nested.push(drop_property(name));
        self
    }

    /// Retains only members for which `predicate` returns `true`.
    #[must_use]
    pub fn filter(mut self, predicate: impl Fn(&Fields) -> Result<bool, String> + 'static) -> Self {
        self.nested.push(filter(predicate));
        self
    }

    /// Nests a further grouping of this group's members.
    #[must_use]
    pub fn group_by(
        mut self,
        key_fields: &[&str],
        child: impl Into<String>,
        configure: impl FnOnce(Group) -> Group,
    ) -> Self {
        self.nested.push(group_by(key_fields, child, configure));
        self
    }

    /// Maintains `output = count(members)`.
    #[must_use]
    pub fn count(mut self, output: impl Into<String>) -> Self {
        self.nested.push(aggregate(AggregateKind::Count, output));
        self
    }

    /// Maintains `output = sum(member[field])`.
    #[must_use]
    pub fn sum(mut self, field: impl Into<String>, output: impl Into<String>) -> Self {
        self.nested.push(aggregate(AggregateKind::Sum(field.into()), output));
        self
    }

    /// Maintains `output = avg(member[field])`.
    #[must_use]
    pub fn avg(mut self, field: impl Into<String>, output: impl Into<String>) -> Self {
        self.nested.push(aggregate(AggregateKind::Avg(field.into()), output));
        self
    }

    /// Maintains `output = min(member[field])`.
    #[must_use]
    pub fn min(mut self, field: impl Into<String>, output: impl Into<String>) -> Self {
        self.nested.push(aggregate(AggregateKind::Min(field.into()), output));
        self
    }

    /// Maintains `output = max(member[field])`.
    #[must_use]
    pub fn max(mut self, field: impl Into<String>, output: impl Into<String>) -> Self {
        self.nested.push(aggregate(AggregateKind::Max(field.into()), output));
        self
    }
}

// ----------------------------------------------------------------------------

fn define_property(name: impl Into<String>, compute: impl Fn(&Fields) -> Result<Value, String> + 'static) -> Op {
    Op::DefineProperty { name: name.into(), compute: Box::new(compute) as ComputeFn }
}

fn drop_property(name: impl Into<String>) -> Op {
    Op::DropProperty { name: name.into() }
}

fn filter(predicate: impl Fn(&Fields) -> Result<bool, String> + 'static) -> Op {
    Op::Filter { predicate: Box::new(predicate) as PredicateFn }
}

fn aggregate(kind: AggregateKind, output: impl Into<String>) -> Op {
    Op::Aggregate(AggregateSpec { kind, output: output.into() })
}

fn group_by(key_fields: &[&str], child: impl Into<String>, configure: impl FnOnce(Group) -> Group) -> Op {
    let group = configure(Group::new());
    Op::GroupBy(GroupSpec {
        key_fields: key_fields.iter().map(|&s| s.to_owned()).collect(),
        child: child.into(),
        nested: group.nested,
    })
}
