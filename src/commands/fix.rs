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

//! `fix`: rewrite a saved `go tool objdump -gnu` listing for llvm-mca.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args};
use log::info;

use crate::transform::RenderConfig;

#[derive(Args, Debug)]
pub struct FixArgs {
    /// Saved output of `go tool objdump -gnu`
    pub input: PathBuf,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "out")]
    pub out: Option<PathBuf>,

    /// Include file name and line in output (`--file`, `--file=false`)
    #[arg(
        long = "file",
        default_value_t = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub file: bool,

    /// Include offset in output
    #[arg(long = "offset", default_value_t = false)]
    pub offset: bool,

    /// Include encoded instructions in output
    #[arg(long = "instr", default_value_t = false)]
    pub instr: bool,

    /// Include Go assembly in output (`--goasm`, `--goasm=false`)
    #[arg(
        long = "goasm",
        default_value_t = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub goasm: bool,
}

impl FixArgs {
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            show_file: self.file,
            show_offset: self.offset,
            show_instruction_bytes: self.instr,
            show_high_level_asm: self.goasm,
        }
    }
}

pub fn run(args: FixArgs) -> Result<()> {
    let config = args.render_config();
    let input = File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    let reader = BufReader::new(input);

    let summary = match &args.out {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut w = BufWriter::new(file);
            let summary = config.transform(reader, &mut w)?;
            let file = w.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()
                .with_context(|| format!("failed to write {}", path.display()))?;
            summary
        }
        None => config.transform(reader, io::stdout().lock())?,
    };

    info!(
        "{}: {} labels, {} instructions{}",
        args.input.display(),
        summary.labels,
        summary.instructions,
        if summary.truncated { ", stopped at ret" } else { "" }
    );
    Ok(())
}
