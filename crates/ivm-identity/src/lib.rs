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

//! Content-hash identity for records with no caller-supplied key.
//!
//! `fingerprint` is deterministic across runs and platforms for a given
//! build of this crate: [`ahash::RandomState`] is seeded with fixed
//! constants rather than the per-process random keys it uses by default, so
//! two processes hashing the same fields reach the same string. It is not a
//! cryptographic hash and must never be used as one.

use std::hash::{BuildHasher, Hasher};

use ahash::RandomState;
use ivm_value::{canonical, Fields};

/// Fixed seed constants, bumped whenever the encoding below changes in a way
/// that would otherwise silently reassign identities across a version
/// upgrade.
const SEED: RandomState = RandomState::with_seeds(
    0x70_61_73_74_65_6c_76_61,
    0x7a_65_6e_73_69_63_61_6c,
    0x69_76_6d_5f_69_64_65_6e,
    0x74_69_74_79_5f_73_65_65,
);

/// A fingerprint version tag, bumped alongside [`SEED`].
const VERSION: &str = "v1";

/// Computes a stable fingerprint over `fields` of `record`.
///
/// `fingerprint(r1, fields) == fingerprint(r2, fields)` iff the selected
/// fields of `r1` and `r2` are structurally equal: values are read in the
/// order `fields` lists them (not the order they appear in the record), and
/// a field absent from the record hashes the same as one present with a
/// `null` value.
#[must_use]
pub fn fingerprint(record: &Fields, fields: &[&str]) -> String {
    hash(fields.iter().map(|&name| (name, record.get(name))))
}

/// Computes a stable fingerprint over every top-level field of `record`.
///
/// Fields are read in sorted-key order, so the result does not depend on
/// the order fields happened to appear in the source document.
#[must_use]
pub fn fingerprint_all(record: &Fields) -> String {
    let mut names: Vec<&str> = record.keys().map(String::as_str).collect();
    names.sort_unstable();
    hash(names.into_iter().map(|name| (name, record.get(name))))
}

fn hash<'a>(selected: impl Iterator<Item = (&'a str, Option<&'a ivm_value::Value>)>) -> String {
    let mut hasher = SEED.build_hasher();
    for (name, value) in selected {
        hasher.write(name.as_bytes());
        hasher.write_u8(0);
        let encoded = value.map_or_else(|| "null".to_owned(), canonical);
        hasher.write(encoded.as_bytes());
        hasher.write_u8(0);
    }
    format!("{VERSION}:{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn structurally_equal_selected_fields_match() {
        let r1 = fields(json!({"a": 1, "b": "x", "c": "ignored"}));
        let r2 = fields(json!({"a": 1, "b": "x", "c": "different"}));
        assert_eq!(fingerprint(&r1, &["a", "b"]), fingerprint(&r2, &["a", "b"]));
    }

    #[test]
    fn distinct_selected_fields_differ() {
        let r1 = fields(json!({"a": 1}));
        let r2 = fields(json!({"a": 2}));
        assert_ne!(fingerprint(&r1, &["a"]), fingerprint(&r2, &["a"]));
    }

    #[test]
    fn fingerprint_all_is_independent_of_field_order() {
        let r1 = fields(json!({"a": 1, "b": 2}));
        let r2 = fields(json!({"b": 2, "a": 1}));
        assert_eq!(fingerprint_all(&r1), fingerprint_all(&r2));
    }

    #[test]
    fn missing_field_matches_explicit_null() {
        let with_null = fields(json!({"a": null}));
        let without = fields(json!({}));
        assert_eq!(fingerprint(&with_null, &["a"]), fingerprint(&without, &["a"]));
    }
}
