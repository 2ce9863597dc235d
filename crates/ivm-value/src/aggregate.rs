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

//! Incremental aggregate state attached to a single group node.

use std::collections::BTreeMap;

use crate::fields::Value;

// ----------------------------------------------------------------------------
// OrdF64
// ----------------------------------------------------------------------------

/// A totally-ordered wrapper around `f64`, for use as a `BTreeMap` key.
///
/// `serde_json::Number` cannot represent NaN or infinities, so any `f64`
/// pulled out of a parsed record is guaranteed comparable by `partial_cmp`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
struct OrdF64(f64);

impl Eq for OrdF64 {}

impl Ord for OrdF64 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.partial_cmp(&other.0).expect("non-finite aggregate value")
    }
}

/// An occurrence-counted multiset of numbers, for incremental min/max.
///
/// A plain running min or max can't be retracted from: removing the current
/// minimum leaves no way to recover the next one without rescanning every
/// member. Keeping the full multiset of contributing values, grouped by
/// value with an occurrence count, makes both insert and remove cheap without
/// needing to touch every sibling.
#[derive(Clone, Debug, Default)]
pub(crate) struct Multiset(BTreeMap<OrdF64, usize>);

impl Multiset {
    fn insert(&mut self, value: f64) {
        *self.0.entry(OrdF64(value)).or_insert(0) += 1;
    }

    /// Removes one occurrence of `value`. Panics if `value` isn't a member,
    /// since the caller only ever retracts a value it previously inserted.
    fn remove(&mut self, value: f64) {
        let key = OrdF64(value);
        match self.0.get_mut(&key) {
            Some(1) => {
                self.0.remove(&key);
            }
            Some(count) => *count -= 1,
            None => panic!("retracted value not present in aggregate state"),
        }
    }

    fn min(&self) -> Option<f64> {
        self.0.keys().next().map(|k| k.0)
    }

    fn max(&self) -> Option<f64> {
        self.0.keys().next_back().map(|k| k.0)
    }
}

// ----------------------------------------------------------------------------
// Aggregate
// ----------------------------------------------------------------------------

/// Running state for one aggregate attached to a group node.
///
/// Each aggregate lives only as long as the node it's attached to: there is
/// no global table keyed by scope, so destroying a node automatically frees
/// its aggregate state.
#[derive(Clone, Debug)]
pub enum Aggregate {
    /// Number of records (directly or transitively) contributing.
    Count(u64),
    /// Running sum of a numeric field.
    Sum(f64),
    /// Running sum and count, for a running mean.
    Avg { sum: f64, count: u64 },
    /// Running minimum of a numeric field.
    Min(Multiset),
    /// Running maximum of a numeric field.
    Max(Multiset),
}

impl Aggregate {
    /// Creates a zeroed aggregate of the given kind.
    #[must_use]
    pub fn count() -> Self {
        Self::Count(0)
    }

    #[must_use]
    pub fn sum() -> Self {
        Self::Sum(0.0)
    }

    #[must_use]
    pub fn avg() -> Self {
        Self::Avg { sum: 0.0, count: 0 }
    }

    #[must_use]
    pub fn min() -> Self {
        Self::Min(Multiset::default())
    }

    #[must_use]
    pub fn max() -> Self {
        Self::Max(Multiset::default())
    }

    /// Folds a newly-contributing value into the aggregate.
    ///
    /// `value` is ignored by `Count` and is `None` for non-numeric or
    /// missing fields under `Sum`/`Avg`/`Min`/`Max`, which simply don't count
    /// that contribution.
    pub fn insert(&mut self, value: Option<f64>) {
        match self {
            Self::Count(count) => *count += 1,
            Self::Sum(sum) => {
                if let Some(value) = value {
                    *sum += value;
                }
            }
            Self::Avg { sum, count } => {
                if let Some(value) = value {
                    *sum += value;
                    *count += 1;
                }
            }
            Self::Min(set) | Self::Max(set) => {
                if let Some(value) = value {
                    set.insert(value);
                }
            }
        }
    }

    /// Unfolds a previously-inserted value from the aggregate.
    ///
    /// `value` must be the same value (or absence of one) passed to the
    /// matching prior [`insert`](Self::insert) call.
    pub fn remove(&mut self, value: Option<f64>) {
        match self {
            Self::Count(count) => *count -= 1,
            Self::Sum(sum) => {
                if let Some(value) = value {
                    *sum -= value;
                }
            }
            Self::Avg { sum, count } => {
                if let Some(value) = value {
                    *sum -= value;
                    *count -= 1;
                }
            }
            Self::Min(set) | Self::Max(set) => {
                if let Some(value) = value {
                    set.remove(value);
                }
            }
        }
    }

    /// Renders the current aggregate value as JSON.
    #[must_use]
    pub fn value(&self) -> Value {
        match self {
            Self::Count(count) => Value::from(*count),
            Self::Sum(sum) => Value::from(*sum),
            Self::Avg { sum, count } => {
                if *count == 0 {
                    Value::Null
                } else {
                    Value::from(sum / *count as f64)
                }
            }
            Self::Min(set) => set.min().map_or(Value::Null, Value::from),
            Self::Max(set) => set.max().map_or(Value::Null, Value::from),
        }
    }
}
