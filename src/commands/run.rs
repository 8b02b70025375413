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

//! `run`: disassemble matching symbols of a Go binary and feed them straight
//! into llvm-mca.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{bail, Context, Result};
use clap::Args;
use regex::Regex;

use crate::pipeline::Pipeline;
use crate::transform::RenderConfig;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Only dump symbols matching this regexp
    #[arg(short = 's', long = "symbol", value_name = "REGEXP")]
    pub symbol: String,

    /// Go binary to disassemble
    pub binary: PathBuf,

    /// Go toolchain used for `go tool objdump`
    #[arg(long = "go", default_value = "go")]
    pub go: OsString,

    /// llvm-mca executable
    #[arg(long = "mca", default_value = "llvm-mca")]
    pub mca: OsString,

    /// Arguments passed through to llvm-mca
    #[arg(last = true, value_name = "MCA_ARGS")]
    pub mca_args: Vec<OsString>,
}

impl RunArgs {
    pub fn objdump_command(&self) -> Command {
        let mut cmd = Command::new(&self.go);
        cmd.args(["tool", "objdump", "-gnu", "-s"])
            .arg(&self.symbol)
            .arg(&self.binary);
        cmd
    }

    pub fn mca_command(&self) -> Command {
        let mut cmd = Command::new(&self.mca);
        cmd.args(&self.mca_args);
        cmd
    }
}

pub fn run(args: RunArgs) -> Result<()> {
    if args.symbol.is_empty() {
        bail!("must set -s flag");
    }
    // objdump would reject it too, but only after llvm-mca is already waiting
    Regex::new(&args.symbol)
        .with_context(|| format!("invalid symbol pattern {:?}", args.symbol))?;

    // llvm-mca only needs the instructions; annotations stay off
    Pipeline::new(args.objdump_command(), args.mca_command()).run(&RenderConfig::default())?;
    Ok(())
}
