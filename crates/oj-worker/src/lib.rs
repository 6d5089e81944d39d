//! Worker Processor (§4.E) — the eight-step compile/run/verdict pipeline
//! for a single submission. Emits one tracing span per job so a job's full
//! judge trace groups together in log output.

mod checker;
mod error;
mod pipeline;

pub use error::{classify, ProcessError, RetryDecision};
pub use pipeline::Processor;
