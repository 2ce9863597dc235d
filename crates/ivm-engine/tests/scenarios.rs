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

//! End-to-end scenarios against the public builder/pipeline surface.

use ivm_engine::{Builder, Fields};
use serde_json::json;

fn record(value: serde_json::Value) -> Fields {
    value.as_object().unwrap().clone()
}

/// S1 - filter + group + sum.
#[test]
fn filter_group_sum() {
    let mut pipeline = Builder::new()
        .filter(|r| Ok(r["inStock"].as_bool().unwrap_or(false)))
        .group_by(&["category"], "items", |g| g.sum("price", "totalInStock"))
        .build();

    pipeline.add("p1", record(json!({"category": "E", "price": 500, "inStock": true}))).unwrap();
    pipeline.add("p2", record(json!({"category": "E", "price": 300, "inStock": false}))).unwrap();
    pipeline.add("p3", record(json!({"category": "E", "price": 200, "inStock": true}))).unwrap();

    let output = pipeline.output();
    assert_eq!(output.len(), 1);
    let group = output[0].to_json();
    assert_eq!(group["category"], json!("E"));
    assert_eq!(group["totalInStock"], json!(700.0));
    assert_eq!(
        group["items"],
        json!([{"price": 500, "inStock": true}, {"price": 200, "inStock": true}])
    );
}

/// S2 - two-level nested grouping, declared outer-first to mirror the tree.
#[test]
fn two_level_nested_grouping() {
    let mut pipeline = Builder::new()
        .group_by(&["state"], "cities", |state| state.group_by(&["city"], "towns", |city| city))
        .build();

    let towns = [
        ("TX", "Dallas", "Addison"),
        ("TX", "Dallas", "Irving"),
        ("TX", "Houston", "Pasadena"),
        ("TX", "Houston", "Sugar Land"),
        ("TX", "Houston", "Pearland"),
        ("OK", "OKC", "Edmond"),
        ("OK", "OKC", "Moore"),
        ("OK", "OKC", "Norman"),
        ("OK", "Tulsa", "Broken Arrow"),
        ("OK", "Tulsa", "Jenks"),
        ("OK", "Tulsa", "Bixby"),
    ];
    for (index, (state, city, town)) in towns.iter().enumerate() {
        let id = format!("town{index}");
        pipeline.add(id, record(json!({"state": state, "city": city, "name": town}))).unwrap();
    }

    let output = pipeline.output();
    assert_eq!(output.len(), 2);

    let tx = output[0].to_json();
    assert_eq!(tx["state"], json!("TX"));
    let tx_cities = tx["cities"].as_array().unwrap();
    assert_eq!(tx_cities.len(), 2);
    assert_eq!(tx_cities[0]["city"], json!("Dallas"));
    assert_eq!(tx_cities[0]["towns"].as_array().unwrap().len(), 2);
    assert_eq!(tx_cities[1]["city"], json!("Houston"));
    assert_eq!(tx_cities[1]["towns"].as_array().unwrap().len(), 3);

    // Removing every town in Dallas removes the Dallas city node; removing
    // every remaining town for TX removes the TX state node.
    pipeline.remove("town0", record(json!({"state": "TX", "city": "Dallas", "name": "Addison"}))).unwrap();
    pipeline.remove("town1", record(json!({"state": "TX", "city": "Dallas", "name": "Irving"}))).unwrap();
    let tx = pipeline.output()[0].to_json();
    assert_eq!(tx["cities"].as_array().unwrap().len(), 1);

    for (index, town) in ["Pasadena", "Sugar Land", "Pearland"].iter().enumerate() {
        pipeline
            .remove(format!("town{}", index + 2), record(json!({"state": "TX", "city": "Houston", "name": town})))
            .unwrap();
    }
    assert_eq!(pipeline.output().len(), 1);
    assert_eq!(pipeline.output()[0].to_json()["state"], json!("OK"));
}

/// S3 - scoped filter inside a group.
#[test]
fn scoped_filter_inside_group() {
    let mut pipeline = Builder::new()
        .group_by(&["department"], "employees", |g| g.filter(|r| Ok(r["salary"].as_i64().unwrap_or(0) >= 50_000)))
        .build();

    pipeline
        .add("alice", record(json!({"department": "Engineering", "name": "Alice", "salary": 80_000})))
        .unwrap();
    pipeline.add("bob", record(json!({"department": "Engineering", "name": "Bob", "salary": 45_000}))).unwrap();
    pipeline
        .add("carol", record(json!({"department": "Engineering", "name": "Carol", "salary": 75_000})))
        .unwrap();

    let output = pipeline.output();
    assert_eq!(output.len(), 1);
    let group = output[0].to_json();
    let employees = group["employees"].as_array().unwrap();
    assert_eq!(employees.len(), 2);
    assert_eq!(employees[0]["name"], json!("Alice"));
    assert_eq!(employees[1]["name"], json!("Carol"));
}

/// S4 - derived property then filter.
#[test]
fn derived_property_then_filter() {
    let mut pipeline = Builder::new()
        .define_property("sum", |r| {
            let a = r["a"].as_i64().unwrap_or(0);
            let b = r["b"].as_i64().unwrap_or(0);
            Ok(json!(a + b))
        })
        .filter(|r| Ok(r["sum"].as_i64().unwrap_or(0) > 10))
        .build();

    pipeline.add("r1", record(json!({"a": 5, "b": 3}))).unwrap();
    pipeline.add("r2", record(json!({"a": 8, "b": 7}))).unwrap();
    pipeline.add("r3", record(json!({"a": 6, "b": 6}))).unwrap();

    let output: Vec<_> = pipeline.output().iter().map(|node| node.to_json()).collect();
    assert_eq!(output, vec![json!({"a": 8, "b": 7, "sum": 15}), json!({"a": 6, "b": 6, "sum": 12})]);
}

/// S5 - retract to empty leaves no residue.
#[test]
fn retract_to_empty() {
    let mut pipeline = Builder::new().group_by(&["category"], "items", |g| g.count("total")).build();

    pipeline.add("p1", record(json!({"category": "E", "price": 1}))).unwrap();
    pipeline.add("p2", record(json!({"category": "E", "price": 2}))).unwrap();
    pipeline.remove("p1", record(json!({"category": "E", "price": 1}))).unwrap();
    pipeline.remove("p2", record(json!({"category": "E", "price": 2}))).unwrap();

    assert!(pipeline.output().is_empty());
}

/// S6 - three-level nesting.
#[test]
fn three_level_nesting() {
    let mut pipeline = Builder::new()
        .group_by(&["state"], "cities", |state| {
            state.group_by(&["city"], "towns", |city| city.group_by(&["town"], "buildings", |town| town))
        })
        .build();

    pipeline
        .add(
            "b1",
            record(json!({"state": "NY", "city": "Albany", "town": "Downtown", "address": "1 Main St"})),
        )
        .unwrap();
    pipeline
        .add(
            "b2",
            record(json!({"state": "NY", "city": "Albany", "town": "Downtown", "address": "2 Main St"})),
        )
        .unwrap();

    let output = pipeline.output();
    assert_eq!(output.len(), 1);
    let state = output[0].to_json();
    let cities = state["cities"].as_array().unwrap();
    assert_eq!(cities.len(), 1);
    let towns = cities[0]["towns"].as_array().unwrap();
    assert_eq!(towns.len(), 1);
    let buildings = towns[0]["buildings"].as_array().unwrap();
    assert_eq!(buildings.len(), 2);
    assert_eq!(buildings[0]["address"], json!("1 Main St"));
    assert_eq!(buildings[1]["address"], json!("2 Main St"));
}

/// S7 - an aggregate reads a property a same-scope `define_property`
/// derives earlier in the declaration, not the member's raw input field.
#[test]
fn aggregate_reads_sibling_derived_property() {
    let mut pipeline = Builder::new()
        .group_by(&["category"], "items", |g| {
            g.define_property("lineTotal", |r| {
                let price = r["price"].as_f64().unwrap_or(0.0);
                let qty = r["qty"].as_f64().unwrap_or(0.0);
                Ok(json!(price * qty))
            })
            .sum("lineTotal", "revenue")
        })
        .build();

    pipeline.add("p1", record(json!({"category": "E", "price": 10.0, "qty": 2.0}))).unwrap();
    pipeline.add("p2", record(json!({"category": "E", "price": 5.0, "qty": 3.0}))).unwrap();

    let output = pipeline.output();
    assert_eq!(output.len(), 1);
    assert_eq!(output[0].to_json()["revenue"], json!(35.0));

    pipeline.remove("p1", record(json!({"category": "E", "price": 10.0, "qty": 2.0}))).unwrap();
    assert_eq!(pipeline.output()[0].to_json()["revenue"], json!(15.0));
}

/// Universal invariant 2: `add(id, r); remove(id, r)` is a no-op.
#[test]
fn insert_retract_pair_is_idempotent() {
    let mut pipeline = Builder::new().group_by(&["category"], "items", |g| g.count("total")).build();
    pipeline.add("p1", record(json!({"category": "E"}))).unwrap();
    pipeline.remove("p1", record(json!({"category": "E"}))).unwrap();
    assert!(pipeline.output().is_empty());
}

/// Universal invariant 3: permuting independent insert order only reorders
/// siblings, never changes multiset membership.
#[test]
fn independent_insert_order_does_not_change_membership() {
    let mut first = Builder::new().group_by(&["category"], "items", |g| g.count("total")).build();
    first.add("a", record(json!({"category": "A"}))).unwrap();
    first.add("b", record(json!({"category": "B"}))).unwrap();

    let mut second = Builder::new().group_by(&["category"], "items", |g| g.count("total")).build();
    second.add("b", record(json!({"category": "B"}))).unwrap();
    second.add("a", record(json!({"category": "A"}))).unwrap();

    let mut first_categories: Vec<_> =
        first.output().iter().map(|node| node.to_json()["category"].clone()).collect();
    let mut second_categories: Vec<_> =
        second.output().iter().map(|node| node.to_json()["category"].clone()).collect();
    first_categories.sort_by_key(ToString::to_string);
    second_categories.sort_by_key(ToString::to_string);
    assert_eq!(first_categories, second_categories);
}
