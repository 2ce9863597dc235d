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

//! Exit-code mapping for the `ivm` driver.

use thiserror::Error;

/// Everything that can send `ivm` home with a non-zero exit code.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Io(std::io::Error),
    #[error("malformed JSON: {0}")]
    Parse(serde_json::Error),
    #[error("input must be a JSON array of objects")]
    NotAnArray,
    #[error("{0}")]
    Programming(String),
}

impl CliError {
    /// Maps this error onto the driver's documented exit codes: 1 for I/O
    /// failure, 2 for malformed or ill-shaped input, 3 for an engine-raised
    /// programming error.
    pub fn code(&self) -> u8 {
        match self {
            Self::Io(_) => 1,
            Self::Parse(_) | Self::NotAnArray => 2,
            Self::Programming(_) => 3,
        }
    }
}
