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

use anyhow::Result;
use clap::{Parser, Subcommand};
use flexi_logger::Logger;

use mca_helper::commands::{fix, run};

/// Prepare `go tool objdump` output for llvm-mca.
#[derive(Parser, Debug)]
#[command(name = "mca-helper", version)]
struct Cli {
    /// Enable debug output (RUST_LOG overrides)
    #[arg(short = 'd', long = "debug", global = true, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Rewrite a saved objdump listing
    Fix(fix::FixArgs),
    /// Pipe objdump of a Go binary through llvm-mca
    Run(run::RunArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { "debug" } else { "warn" };
    let _logger = Logger::try_with_env_or_str(level)?.log_to_stderr().start()?;

    match cli.command {
        Cmd::Fix(args) => fix::run(args),
        Cmd::Run(args) => run::run(args),
    }
}
