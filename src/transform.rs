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

//! Rewrites `go tool objdump -gnu` output into an llvm-mca input listing.
//!
//! Symbol headers become labels, each instruction line becomes its GNU
//! mnemonic followed by optional provenance comments. Processing stops for the
//! whole stream at the first `ret`, so only the first function body reaches the
//! analyzer; any later symbols are dropped.
//!
//! Lines are handled as bytes. File names, symbols and mnemonics that are not
//! UTF-8 reach the output unchanged.

use std::io::{self, BufRead, Write};

use log::debug;

use crate::error::TransformResult;
use crate::instr::Instruction;
use crate::symbols::{header_symbol, mangle};
use crate::tab_writer::TabWriter;

/// GNU mnemonic of the unconditional return that ends the listing.
pub const RETURN_MNEMONIC: &str = "ret";

/// Which annotations follow each instruction. Fixed for a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderConfig {
    /// `file:line`
    pub show_file: bool,
    /// `0x` prefixed byte offset within the function
    pub show_offset: bool,
    /// raw encoding as hex
    pub show_instruction_bytes: bool,
    /// objdump's own (Go) mnemonic
    pub show_high_level_asm: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformSummary {
    pub labels: usize,
    pub instructions: usize,
    /// A return instruction was reached and the rest of the input skipped.
    pub truncated: bool,
}

impl RenderConfig {
    /// Every annotation enabled.
    pub fn all() -> Self {
        Self {
            show_file: true,
            show_offset: true,
            show_instruction_bytes: true,
            show_high_level_asm: true,
        }
    }

    /// Transform a complete listing from `r` into `w`.
    ///
    /// Output is column-aligned and buffered; it is flushed before returning
    /// `Ok`. On error, whatever was buffered is dropped.
    pub fn transform<R: BufRead, W: Write>(
        &self,
        mut r: R,
        w: W,
    ) -> TransformResult<TransformSummary> {
        let mut tw = TabWriter::new(w);
        let mut summary = TransformSummary::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if r.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = trim_newline(&buf);

            if let Some(symbol) = header_symbol(line) {
                tw.write_all(&mangle(symbol))?;
                tw.write_all(b"\n")?;
                summary.labels += 1;
                continue;
            }

            let instr = Instruction::parse(line)?;
            if instr.gnu_asm == RETURN_MNEMONIC.as_bytes() {
                tw.write_all(b"\t// stopping at ")?;
                tw.write_all(&instr.gnu_asm)?;
                tw.write_all(b"\n")?;
                summary.truncated = true;
                break;
            }
            self.render(&mut tw, &instr)?;
            summary.instructions += 1;
        }

        tw.flush()?;
        debug!(
            "transform done: {} labels, {} instructions, truncated={}",
            summary.labels, summary.instructions, summary.truncated
        );
        Ok(summary)
    }

    fn render<W: Write>(&self, w: &mut W, instr: &Instruction) -> io::Result<()> {
        w.write_all(b"  ")?;
        w.write_all(&instr.gnu_asm)?;

        let mut comment = Comment { w, opened: false };
        if self.show_file {
            let mut location = instr.file.clone();
            write!(location, ":{}", instr.line)?;
            comment.segment(&location)?;
        }
        if self.show_offset {
            comment.segment(format!("{:#x}", instr.offset).as_bytes())?;
        }
        if self.show_instruction_bytes {
            comment.segment(instr.hex_bytes().as_bytes())?;
        }
        if self.show_high_level_asm {
            comment.segment(&instr.go_asm)?;
        }
        comment.w.write_all(b"\n")
    }
}

/// Strip the line terminator, `\n` or `\r\n`.
fn trim_newline(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Trailing annotation cells; the first one opens the `//` comment.
struct Comment<'a, W: Write> {
    w: &'a mut W,
    opened: bool,
}

impl<W: Write> Comment<'_, W> {
    fn segment(&mut self, text: &[u8]) -> io::Result<()> {
        if self.opened {
            self.w.write_all(b"\t")?;
        } else {
            self.opened = true;
            self.w.write_all(b"\t// ")?;
        }
        self.w.write_all(text)
    }
}
