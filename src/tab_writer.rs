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

//! Elastic tab-stop writer.
//!
//! Bytes written here are split into cells at `\t`. Consecutive lines that share
//! a tab-terminated cell in the same column form a column block, and every cell
//! of a block is padded with tabs to the block's widest cell, so annotation
//! comments line up across instruction lines. The last cell of a line is never
//! aligned. Nothing reaches the inner writer until a line is known not to
//! affect earlier alignment, or until [`TabWriter::flush`] is called.
//!
//! Input need not be UTF-8 and is passed through unchanged. A cell's width is
//! its number of characters, with every byte that is not part of a valid UTF-8
//! sequence counting as one.

use std::io::{self, Write};

#[derive(Debug, Clone, Copy)]
pub struct TabStops {
    /// Minimum cell width, padding included.
    pub min_width: usize,
    pub tab_width: usize,
    /// Added to the widest text in a column.
    pub padding: usize,
}

impl Default for TabStops {
    fn default() -> Self {
        Self {
            min_width: 18,
            tab_width: 8,
            padding: 1,
        }
    }
}

#[derive(Debug, Default)]
struct Cell {
    text: Vec<u8>,
    width: usize,
}

pub struct TabWriter<W: Write> {
    inner: W,
    stops: TabStops,
    lines: Vec<Vec<Cell>>,
    current: Vec<Cell>,
    cell: Vec<u8>,
    widths: Vec<usize>,
    // Set while flushing a last line that never saw its newline.
    unterminated: bool,
}

impl<W: Write> TabWriter<W> {
    pub fn new(inner: W) -> Self {
        Self::with_stops(inner, TabStops::default())
    }

    pub fn with_stops(inner: W, stops: TabStops) -> Self {
        Self {
            inner,
            stops,
            lines: Vec::new(),
            current: Vec::new(),
            cell: Vec::new(),
            widths: Vec::new(),
            unterminated: false,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwraps the writer. Buffered text that was never flushed is discarded.
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn terminate_cell(&mut self) -> usize {
        let text = std::mem::take(&mut self.cell);
        let width = char_width(&text);
        self.current.push(Cell { text, width });
        self.current.len()
    }

    fn push_bytes(&mut self, buf: &[u8]) -> io::Result<()> {
        let mut rest = buf;
        while let Some(i) = rest.iter().position(|&c| c == b'\t' || c == b'\n') {
            self.cell.extend_from_slice(&rest[..i]);
            let cells = self.terminate_cell();
            if rest[i] == b'\n' {
                let line = std::mem::take(&mut self.current);
                self.lines.push(line);
                // A single-cell line cannot widen any column; emit what we have.
                if cells == 1 {
                    self.write_buffered()?;
                }
            }
            rest = &rest[i + 1..];
        }
        self.cell.extend_from_slice(rest);
        Ok(())
    }

    /// Writes out all buffered lines, completed or not, and flushes the inner
    /// writer.
    pub fn flush(&mut self) -> io::Result<()> {
        if !self.cell.is_empty() {
            self.terminate_cell();
        }
        if !self.current.is_empty() {
            let line = std::mem::take(&mut self.current);
            self.lines.push(line);
            self.unterminated = true;
        }
        self.write_buffered()?;
        self.inner.flush()
    }

    fn write_buffered(&mut self) -> io::Result<()> {
        let line1 = self.lines.len();
        let res = self.format(0, line1);
        self.lines.clear();
        self.widths.clear();
        self.unterminated = false;
        res
    }

    fn format(&mut self, mut line0: usize, line1: usize) -> io::Result<()> {
        let column = self.widths.len();
        let mut this = line0;
        while this < line1 {
            if !self.has_aligned_cell(this, column) {
                this += 1;
                continue;
            }

            self.write_lines(line0, this)?;
            line0 = this;

            let mut width = self.stops.min_width;
            while this < line1 && self.has_aligned_cell(this, column) {
                width = width.max(self.lines[this][column].width + self.stops.padding);
                this += 1;
            }

            self.widths.push(width);
            self.format(line0, this)?;
            self.widths.pop();
            line0 = this;
        }
        self.write_lines(line0, line1)
    }

    fn has_aligned_cell(&self, line: usize, column: usize) -> bool {
        column + 1 < self.lines[line].len()
    }

    fn write_lines(&mut self, line0: usize, line1: usize) -> io::Result<()> {
        let last = self.lines.len().saturating_sub(1);
        for i in line0..line1 {
            let line = &self.lines[i];
            for (j, c) in line.iter().enumerate() {
                self.inner.write_all(&c.text)?;
                if j < self.widths.len() {
                    let tabs = tab_padding(&self.stops, c.width, self.widths[j]);
                    self.inner.write_all("\t".repeat(tabs).as_bytes())?;
                }
            }
            if !(self.unterminated && i == last) {
                self.inner.write_all(b"\n")?;
            }
        }
        Ok(())
    }
}

fn char_width(text: &[u8]) -> usize {
    text.utf8_chunks()
        .map(|chunk| chunk.valid().chars().count() + chunk.invalid().len())
        .sum()
}

/// Number of tabs that move a cell of `text_width` chars to the next tab stop
/// at or past `cell_width`.
fn tab_padding(stops: &TabStops, text_width: usize, cell_width: usize) -> usize {
    let tw = stops.tab_width;
    let cell_width = cell_width.div_ceil(tw) * tw;
    (cell_width - text_width).div_ceil(tw)
}

impl<W: Write> Write for TabWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.push_bytes(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        TabWriter::flush(self)
    }
}
