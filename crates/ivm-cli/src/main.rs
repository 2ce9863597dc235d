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

//! `ivm <input.json> <output.json>`
//!
//! Reads a JSON array of records, assigns each one an identity by hashing
//! every one of its fields, feeds them through a pipeline, and writes the
//! resulting sink array back out as JSON.
//!
//! The pipeline driven here is the identity pipeline (no operators): this
//! binary exists to exercise the engine end to end, not to ship a particular
//! business pipeline - declaring pipelines is a job for the code embedding
//! `ivm-engine`, not for this file.

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ivm_engine::Builder;

mod error;

use error::CliError;

/// Command-line arguments for the `ivm` driver.
#[derive(Debug, Parser)]
#[command(name = "ivm", about = "Run a JSON array of records through an IVM pipeline")]
struct Args {
    /// Path to the input JSON array.
    input: PathBuf,
    /// Path the materialized sink is written to.
    output: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ivm: {err}");
            ExitCode::from(err.code())
        }
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let input = fs::read_to_string(&args.input).map_err(CliError::Io)?;
    let document: serde_json::Value = serde_json::from_str(&input).map_err(CliError::Parse)?;
    let serde_json::Value::Array(records) = document else {
        return Err(CliError::NotAnArray);
    };
    let records = records
        .into_iter()
        .map(|record| match record {
            serde_json::Value::Object(fields) => Ok(fields),
            _ => Err(CliError::NotAnArray),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let pipeline = feed(records).map_err(CliError::Programming)?;

    let sink: Vec<_> = pipeline.output().iter().map(ivm_engine::Node::to_json).collect();
    let rendered = serde_json::to_string_pretty(&sink).map_err(CliError::Parse)?;
    fs::write(&args.output, rendered).map_err(CliError::Io)?;
    Ok(())
}

/// Feeds every record through a fresh pipeline, catching the panic that a
/// misuse of the engine API (a reserved-character name, a duplicate
/// identity) raises, and turning it into a plain error message instead of
/// an uncaught abort. Suppresses the default panic report for the duration:
/// the caller already renders the message via the returned `Err`.
fn feed(records: Vec<ivm_engine::Fields>) -> Result<ivm_engine::Pipeline, String> {
    let hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> Result<ivm_engine::Pipeline, ivm_engine::Error> {
        let mut pipeline = Builder::new().build();
        for fields in records {
            let id = ivm_identity::fingerprint_all(&fields);
            pipeline.add(id, fields)?;
        }
        Ok(pipeline)
    }));
    panic::set_hook(hook);

    match outcome {
        Ok(Ok(pipeline)) => Ok(pipeline),
        Ok(Err(err)) => Err(err.to_string()),
        Err(panic) => Err(panic
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| panic.downcast_ref::<&str>().map(|&s| s.to_owned()))
            .unwrap_or_else(|| "engine panicked with a non-string payload".to_owned())),
    }
}
