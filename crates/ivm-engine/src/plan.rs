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

//! Read-only evaluation of a record against an operator chain.
//!
//! Planning and application are deliberately separate passes. The engine
//! must never partially apply a failing event (a `Caller` error from a
//! predicate or derived property must leave the sink untouched), so a plan
//! is computed purely first - touching no group node - and only once it
//! succeeds end to end does the second pass mutate the tree. Retract reuses
//! the exact same planner: on the caller's guarantee that a retracted record
//! is identical to the one it reverses, it recomputes the identical path.

use ivm_value::{canonical, Fields, Value};

use crate::error::Error;
use crate::op::{GroupSpec, Op};

/// The outcome of planning one record against an operator chain.
pub enum PlanStep<'a> {
    /// The record survived to become (or remain) a leaf.
    Leaf(Fields),
    /// The record belongs inside a group at this level.
    Enter {
        spec: &'a GroupSpec,
        group_key: String,
        key_fields: Fields,
        agg_inputs: Vec<Option<f64>>,
        next: Box<PlanStep<'a>>,
    },
}

/// Plans `fields` against `ops`, returning `None` if any filter rejects it.
///
/// The aggregate samples collected along the way (for whichever group owns
/// this op sequence) are discarded here; only [`plan_group`] needs them, to
/// attach to the [`PlanStep::Enter`] it produces.
pub fn plan<'a>(ops: &'a [Op], fields: Fields) -> Result<Option<PlanStep<'a>>, Error> {
    Ok(plan_sequence(ops, fields)?.map(|(step, _agg_inputs)| step))
}

/// Runs one op sequence - a pipeline's root, or one group's `nested` list -
/// against `fields`, returning both the resulting step and the aggregate
/// samples taken at this exact level, in declared order.
///
/// Aggregates are sampled in place as the sequence is walked, not hoisted
/// out and read before the sequence runs: a `defineProperty` declared
/// earlier in the same group must be visible to a `sum`/`avg`/`min`/`max`
/// declared after it, the same way it would be visible to a `filter`.
fn plan_sequence<'a>(ops: &'a [Op], mut fields: Fields) -> Result<Option<(PlanStep<'a>, Vec<Option<f64>>)>, Error> {
    let mut agg_inputs = Vec::new();
    for op in ops {
        match op {
            Op::DefineProperty { name, compute } => {
                let value = compute(&fields).map_err(Error::Caller)?;
                fields.insert(name.clone(), value);
            }
            Op::DropProperty { name } => {
                fields.remove(name);
            }
            Op::Filter { predicate } => {
                if !predicate(&fields).map_err(Error::Caller)? {
                    return Ok(None);
                }
            }
            Op::Aggregate(spec) => {
                let input = spec.kind.field().and_then(|field| fields.get(field)).and_then(Value::as_f64);
                agg_inputs.push(input);
            }
            Op::GroupBy(spec) => {
                return Ok(plan_group(spec, fields)?.map(|step| (step, agg_inputs)));
            }
        }
    }
    Ok(Some((PlanStep::Leaf(fields), agg_inputs)))
}

/// Plans the `groupBy` stage itself: extracts the key, then recurses into
/// the group's nested scope with the key fields stripped, which is also
/// where that group's own aggregates (if any) get sampled.
fn plan_group(spec: &GroupSpec, mut fields: Fields) -> Result<Option<PlanStep<'_>>, Error> {
    let mut key_fields = Fields::new();
    for name in &spec.key_fields {
        let value = fields.remove(name).unwrap_or(Value::Null);
        key_fields.insert(name.clone(), value);
    }
    let group_key = canonical(&Value::Object(key_fields.clone()));

    let Some((next, agg_inputs)) = plan_sequence(&spec.nested, fields)? else {
        return Ok(None);
    };
    Ok(Some(PlanStep::Enter { spec, group_key, key_fields, agg_inputs, next: Box::new(next) }))
}
