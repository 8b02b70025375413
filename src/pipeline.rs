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

//! Runs disassembler | transform | analyzer.
//!
//! Three activities run on their own threads until all of them finish: the
//! transform (producer stdout -> consumer stdin), a wait on the producer and a
//! wait on the consumer. The consumer's stdin is owned by the transform and is
//! closed as soon as the transform returns, on success or failure; that EOF is
//! the only way the analyzer learns the listing is complete.
//!
//! There is no timeout. A child that never exits keeps the pipeline waiting,
//! and a failing transform does not kill either child.

use std::ffi::OsStr;
use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};
use std::thread;

use log::{debug, info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::transform::RenderConfig;

pub struct Pipeline {
    producer: Command,
    consumer: Command,
}

impl Pipeline {
    /// `producer` must write a disassembly listing to stdout, `consumer` reads
    /// the transformed listing on stdin. Their other streams are left as
    /// configured by the caller.
    pub fn new(producer: Command, consumer: Command) -> Self {
        Self { producer, consumer }
    }

    pub fn run(mut self, config: &RenderConfig) -> PipelineResult<()> {
        let producer_name = program_name(self.producer.get_program());
        let consumer_name = program_name(self.consumer.get_program());
        info!("running {:?} | {:?}", self.producer, self.consumer);

        let mut producer = self
            .producer
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| PipelineError::Spawn {
                program: producer_name.clone(),
                source,
            })?;
        debug!("{} started (pid {})", producer_name, producer.id());

        let mut consumer = match self.consumer.stdin(Stdio::piped()).spawn() {
            Ok(child) => child,
            Err(source) => {
                kill_and_reap(&producer_name, &mut producer);
                return Err(PipelineError::Spawn {
                    program: consumer_name,
                    source,
                });
            }
        };
        debug!("{} started (pid {})", consumer_name, consumer.id());

        let pipes = take_pipes(
            (producer_name.as_str(), producer.stdout.take()),
            (consumer_name.as_str(), consumer.stdin.take()),
        );
        let (stdout, stdin) = match pipes {
            Ok(pipes) => pipes,
            Err(e) => {
                kill_and_reap(&producer_name, &mut producer);
                kill_and_reap(&consumer_name, &mut consumer);
                return Err(e);
            }
        };

        join_stages(
            config,
            BufReader::new(stdout),
            stdin,
            move || wait_child(&producer_name, producer),
            move || wait_child(&consumer_name, consumer),
        )
    }
}

/// Run the transform from `reader` into `writer` concurrently with the two
/// wait functions and report the first failure, in the order transform,
/// producer, consumer. Later failures are logged and dropped.
///
/// `writer` is dropped when the transform returns. After a transform that
/// stopped at a return instruction the rest of `reader` is read and discarded
/// so the producer is not left blocked on a full pipe.
pub fn join_stages<R, W, P, C>(
    config: &RenderConfig,
    reader: R,
    writer: W,
    wait_producer: P,
    wait_consumer: C,
) -> PipelineResult<()>
where
    R: BufRead + Send,
    W: Write + Send,
    P: FnOnce() -> PipelineResult<()> + Send,
    C: FnOnce() -> PipelineResult<()> + Send,
{
    let config = *config;
    thread::scope(|s| {
        let transform = s.spawn(move || transform_stage(&config, reader, writer));
        let producer = s.spawn(wait_producer);
        let consumer = s.spawn(wait_consumer);

        let results = [
            join_stage(transform),
            join_stage(producer),
            join_stage(consumer),
        ];
        first_failure(results)
    })
}

/// Pair up the producer's stdout and the consumer's stdin. A missing pipe is
/// reported against the child it belongs to.
fn take_pipes<O, I>(
    (producer, stdout): (&str, Option<O>),
    (consumer, stdin): (&str, Option<I>),
) -> PipelineResult<(O, I)> {
    let stdout = stdout.ok_or_else(|| PipelineError::MissingPipe {
        program: producer.to_string(),
        stream: "stdout",
    })?;
    let stdin = stdin.ok_or_else(|| PipelineError::MissingPipe {
        program: consumer.to_string(),
        stream: "stdin",
    })?;
    Ok((stdout, stdin))
}

fn transform_stage<R: BufRead, W: Write>(
    config: &RenderConfig,
    mut reader: R,
    writer: W,
) -> PipelineResult<()> {
    // `writer` moves into the transform and is closed when it returns.
    let summary = config.transform(&mut reader, writer)?;
    if summary.truncated {
        let skipped = io::copy(&mut reader, &mut io::sink())?;
        debug!("discarded {} bytes of disassembly after the return", skipped);
    }
    Ok(())
}

fn join_stage(handle: thread::ScopedJoinHandle<'_, PipelineResult<()>>) -> PipelineResult<()> {
    match handle.join() {
        Ok(res) => res,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

fn first_failure(results: [PipelineResult<()>; 3]) -> PipelineResult<()> {
    let mut first = None;
    for err in results.into_iter().filter_map(Result::err) {
        if first.is_none() {
            info!("pipeline failed: {}", err);
            first = Some(err);
        } else {
            debug!("ignoring later pipeline failure: {}", err);
        }
    }
    first.map_or(Ok(()), Err)
}

fn wait_child(program: &str, mut child: Child) -> PipelineResult<()> {
    let status = child.wait()?;
    debug!("{} exited: {}", program, status);
    if status.success() {
        Ok(())
    } else {
        Err(PipelineError::Exit {
            program: program.to_string(),
            status,
        })
    }
}

fn kill_and_reap(program: &str, child: &mut Child) {
    if let Err(e) = child.kill() {
        warn!("failed to kill {}: {}", program, e);
    }
    if let Err(e) = child.wait() {
        warn!("failed to reap {}: {}", program, e);
    }
}

fn program_name(program: &OsStr) -> String {
    program.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    /// Writer that counts how often it is closed (dropped) and signals the
    /// fake consumer through a channel.
    struct ClosingWriter<'a> {
        buf: Vec<u8>,
        closed: &'a AtomicUsize,
        tx: mpsc::Sender<Vec<u8>>,
    }

    impl Write for ClosingWriter<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.buf.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.tx.send(std::mem::take(&mut self.buf)).ok();
            Ok(())
        }
    }

    impl Drop for ClosingWriter<'_> {
        fn drop(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn io_err(msg: &str) -> PipelineError {
        PipelineError::Io(io::Error::other(msg.to_string()))
    }

    #[test]
    fn consumer_sees_output_then_eof() {
        let closed = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel();
        let writer = ClosingWriter {
            buf: Vec::new(),
            closed: &closed,
            tx,
        };
        let input = "TEXT f(SB)\nf.s:1 0x0 8b010000 ADD R1, R0, R0 // add x0, x0, x1\n";
        let res = join_stages(
            &RenderConfig::default(),
            input.as_bytes(),
            writer,
            || Ok(()),
            move || {
                // returns only once the writer side has gone away
                let got: Vec<u8> = rx.iter().flatten().collect();
                assert_eq!(got, b"f_SB_:\n  add x0, x0, x1\n");
                Ok(())
            },
        );
        res.unwrap();
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn transform_failure_closes_writer_once() {
        let closed = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel();
        let writer = ClosingWriter {
            buf: Vec::new(),
            closed: &closed,
            tx,
        };
        let res = join_stages(
            &RenderConfig::default(),
            "not a listing\n".as_bytes(),
            writer,
            || Ok(()),
            move || {
                for _ in rx.iter() {}
                Ok(())
            },
        );
        match res {
            Err(PipelineError::Transform(TransformError::Syntax(e))) => {
                assert_eq!(e.line, "not a listing")
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn first_failure_follows_start_order() {
        let res = join_stages(
            &RenderConfig::default(),
            "".as_bytes(),
            io::sink(),
            || Err(io_err("producer")),
            || Err(io_err("consumer")),
        );
        assert_eq!(res.unwrap_err().to_string(), "i/o error: producer");

        let res = join_stages(
            &RenderConfig::default(),
            "bogus\n".as_bytes(),
            io::sink(),
            || Err(io_err("producer")),
            || Err(io_err("consumer")),
        );
        assert!(matches!(res, Err(PipelineError::Transform(_))));

        let res = join_stages(
            &RenderConfig::default(),
            "".as_bytes(),
            io::sink(),
            || Ok(()),
            || Err(io_err("consumer")),
        );
        assert_eq!(res.unwrap_err().to_string(), "i/o error: consumer");
    }

    #[test]
    fn missing_pipe_names_its_owner() {
        let err = take_pipes(("go", Some(())), ("llvm-mca", None::<()>)).unwrap_err();
        assert_eq!(err.to_string(), "llvm-mca has no stdin pipe");

        let err = take_pipes(("go", None::<()>), ("llvm-mca", Some(()))).unwrap_err();
        assert_eq!(err.to_string(), "go has no stdout pipe");

        let err = take_pipes(("go", None::<()>), ("llvm-mca", None::<()>)).unwrap_err();
        assert!(matches!(err, PipelineError::MissingPipe { program, .. } if program == "go"));

        assert_eq!(take_pipes(("go", Some(1)), ("llvm-mca", Some(2))).unwrap(), (1, 2));
    }

    #[test]
    fn reader_is_drained_after_truncation() {
        let mut input = String::from("a.s:1 0x0 d65f03c0 RET // ret\n");
        for i in 0..1000 {
            input.push_str(&format!("a.s:{} 0x{:x} d503201f NOOP // nop\n", i + 2, i * 4 + 4));
        }
        let mut reader = input.as_bytes();
        let mut out = Vec::new();
        join_stages(&RenderConfig::default(), &mut reader, &mut out, || Ok(()), || Ok(())).unwrap();
        assert!(reader.is_empty());
        assert_eq!(out, b"\t\t\t// stopping at ret\n");
    }
}
