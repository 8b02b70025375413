// Crate root: declare modules and control visibility
pub mod commands;
pub mod error;
pub mod instr;
pub mod pipeline;
pub mod symbols;
pub mod tab_writer;
pub mod transform;

// Re-export commonly used API from the library for binaries/tests
pub use error::{PipelineError, SyntaxError, SyntaxErrorKind, TransformError};
pub use instr::Instruction;
pub use pipeline::{join_stages, Pipeline};
pub use symbols::mangle;
pub use transform::{RenderConfig, TransformSummary};
