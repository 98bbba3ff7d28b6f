//! Rule evaluation engine
//!
//! This crate turns records into per-kind scores:
//! - Max-not-sum score accumulation with strict-raise evidence
//! - Category-precedence rule matching per record
//! - Page-bounded source walks with ceiling short-circuit and
//!   best-effort degradation on fetch failure

pub mod accumulator;
pub mod context;
pub mod evaluator;

pub use accumulator::{RecordTally, ScoreAccumulator};
pub use context::EvalContext;
pub use evaluator::RuleEvaluator;
