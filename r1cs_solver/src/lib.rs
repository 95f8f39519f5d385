//! Solver for compiled rank-1 constraint systems.
//!
//! A compiled [`R1CS`] is a sequence of constraints `L * R = O` over linear
//! expressions of wires, ordered so that each constraint has at most one wire
//! that is not yet known when it is reached. Given the public and secret inputs,
//! [`R1CS::solve`] walks the constraints once, computes every remaining wire
//! (calling out to [`hint`] functions where algebra alone is not enough) and
//! checks each constraint as it goes.

pub mod coefficients;
pub mod constraint_system;
pub mod curve;
pub mod debug;
pub mod error;
pub mod hint;
pub mod linear_combination;
pub mod serialization;
pub mod solver;

#[cfg(test)]
pub(crate) mod test_utils;

pub use coefficients::{CoeffId, CoeffTable};
pub use constraint_system::{CompiledR1CS, Hint, R1CSBuilder, R1CS, R1C};
pub use curve::{CurveField, CurveId};
pub use debug::{LogEntry, LogItem, LogSink};
pub use error::{Error, HintError};
pub use hint::{HintFunction, HintFunctions, HintId};
pub use linear_combination::{LinearExpression, Term, Variable, Visibility};

/// A circuit that knows how to lay itself out as constraints.
pub trait Circuit<F: CurveField> {
    fn synthesize(&self, cs: &mut R1CSBuilder<F>);
}
