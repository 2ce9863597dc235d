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

//! Errors raised while declaring or driving a pipeline.

/// A failure raised by the engine.
///
/// Only [`Error::Caller`] is ever returned from [`Pipeline::add`] or
/// [`Pipeline::remove`](crate::Pipeline::remove) — a predicate or derived
/// property closure returned `Err`, and the pipeline's state was left
/// untouched. [`Error::Programming`] is never returned: it names an
/// unrecoverable misuse of the API (a reserved character in a declared name,
/// an unknown or already-retracted identity) and is raised by panicking
/// immediately, since these conditions mean the caller and the engine have
/// disagreed about the pipeline's own contract and continuing would silently
/// violate it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An unrecoverable misuse of the engine API.
    #[error("programming error: {0}")]
    Programming(String),
    /// A predicate or derived-property closure failed.
    #[error("caller error: {0}")]
    Caller(String),
}

/// Panics with a formatted [`Error::Programming`].
///
/// Centralizing this keeps the panic message consistent with the `Display`
/// impl callers see if they downcast a caught unwind, without needing every
/// call site to build the variant by hand.
#[cold]
#[track_caller]
pub(crate) fn programming(message: impl Into<String>) -> ! {
    panic!("{}", Error::Programming(message.into()));
}
