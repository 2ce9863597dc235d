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

//! The operator kernel: the tagged variant set and its per-operator state.

use ivm_value::{Fields, Value};

/// A pure derived-property function.
///
/// Boxed as a trait object rather than generic over the pipeline, since a
/// pipeline holds a heterogeneous sequence of operators each carrying their
/// own closure type; matching on a tagged `enum` here is what keeps dispatch
/// off the hot path instead of going through a vtable per trait object.
pub type ComputeFn = Box<dyn Fn(&Fields) -> Result<Value, String>>;

/// A pure predicate function.
pub type PredicateFn = Box<dyn Fn(&Fields) -> Result<bool, String>>;

// ----------------------------------------------------------------------------
// Operator
// ----------------------------------------------------------------------------

/// One stage of a pipeline, or of a group's nested scope.
pub enum Op {
    /// Computes a derived scalar and merges it into the record.
    DefineProperty { name: String, compute: ComputeFn },
    /// Projects away a field.
    DropProperty { name: String },
    /// Includes only records satisfying a predicate.
    Filter { predicate: PredicateFn },
    /// Samples a member field into the enclosing group's running aggregate.
    ///
    /// Declared at its position in the nested sequence rather than hoisted
    /// out, so a `defineProperty` declared earlier in the same group sees
    /// its effect: `g.define_property("total", ..).sum("total", "value")`
    /// samples the field `define_property` just inserted, not whatever
    /// `"total"` held on the way into the group.
    Aggregate(AggregateSpec),
    /// Partitions the input into groups keyed by a field tuple.
    GroupBy(GroupSpec),
}

/// The declaration of one `groupBy` stage and everything nested inside it.
///
/// Nesting a further `groupBy` inside `nested` is how chained grouping is
/// expressed: a pipeline fixture that would read
/// `groupBy(['state','city'],'towns').groupBy(['state'],'cities')` against a
/// flat, re-wrapping builder is declared here the other way around, as a
/// single `group_by(["state"], "cities", |g| g.group_by(["city"], "towns", ..))`
/// call — the nesting in the source directly mirrors the nesting of the
/// output, rather than requiring the reader to mentally replay a sequence of
/// re-wraps.
///
/// A further `GroupBy` nested here must be declared last: like `Filter`,
/// anything declared after it in the same sequence is unreachable, since
/// every member either stays at this level (ending in `Leaf`) or descends
/// into the nested group - there is no "after" at the same level once that
/// happens.
pub struct GroupSpec {
    pub key_fields: Vec<String>,
    pub child: String,
    pub nested: Vec<Op>,
}

impl GroupSpec {
    /// Iterates this group's own declared aggregates, in declared order.
    ///
    /// Only looks at `nested`'s direct entries - an aggregate declared
    /// inside a further nested `GroupBy` belongs to that deeper group, not
    /// to this one, and stays encapsulated in its own `GroupSpec::nested`.
    pub fn aggregates(&self) -> impl Iterator<Item = &AggregateSpec> {
        self.nested.iter().filter_map(|op| match op {
            Op::Aggregate(spec) => Some(spec),
            _ => None,
        })
    }
}

/// One aggregate declared on a group, and the field it reads.
pub struct AggregateSpec {
    pub kind: AggregateKind,
    pub output: String,
}

/// The kind of running aggregate an [`AggregateSpec`] maintains.
pub enum AggregateKind {
    /// Count of contributing members.
    Count,
    /// Running sum of a numeric field.
    Sum(String),
    /// Running mean of a numeric field.
    Avg(String),
    /// Running minimum of a numeric field.
    Min(String),
    /// Running maximum of a numeric field.
    Max(String),
}

impl AggregateKind {
    /// Returns the member field this aggregate reads, if any.
    ///
    /// `Count` reads nothing: every contributing member counts regardless of
    /// its fields.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Count => None,
            Self::Sum(field) | Self::Avg(field) | Self::Min(field) | Self::Max(field) => {
                Some(field)
            }
        }
    }
}
