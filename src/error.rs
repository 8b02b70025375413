// Copyright (c) 2026 MCU-Debug Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for parsing, transforming and piping disassembly.

use std::io;
use std::process::ExitStatus;

use thiserror::Error;

/// Which grammar element of an objdump line was missing or malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    MissingColon,
    InvalidNumber,
    MissingOffsetPrefix,
    InvalidHex,
    MissingCommentMarker,
}

/// A disassembly line that does not match the expected layout.
///
/// `line` is the text as it was read, before trimming, so it can be matched
/// against the disassembler's own output. Bytes that are not UTF-8 show up as
/// U+FFFD.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("syntax error: {reason} ({line})")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub reason: &'static str,
    pub line: String,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, reason: &'static str, line: &[u8]) -> Self {
        Self {
            kind,
            reason,
            line: String::from_utf8_lossy(line).into_owned(),
        }
    }
}

#[derive(Error, Debug)]
pub enum TransformError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}")]
    Exit { program: String, status: ExitStatus },

    #[error("{program} has no {stream} pipe")]
    MissingPipe {
        program: String,
        stream: &'static str,
    },

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

pub type TransformResult<T> = Result<T, TransformError>;
pub type PipelineResult<T> = Result<T, PipelineError>;
