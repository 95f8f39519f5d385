//! Debug traces and instrumentation logs.
//!
//! Both are stored as [`LogEntry`] templates whose arguments reference wires; they are only
//! rendered against a [`Solution`] once the values are known.

use std::{
    fmt,
    io::{self, Write},
    ops::{Deref, DerefMut},
    sync::{Arc, Mutex},
};

use ark_ff::PrimeField;
use num_bigint::BigUint;

use crate::{
    coefficients::CoeffId,
    curve::CurveField,
    linear_combination::{LinearExpression, Term},
    solver::Solution,
};

const UNSOLVED: &str = "<unsolved>";

/// One argument of a [`LogEntry`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LogItem {
    /// A single term: its coefficient (unless it is ±1) followed by the wire value.
    Term(Term),
    /// The evaluated sum of an expression.
    Eval(LinearExpression),
}

/// A message template. Each `{}` in `format` is replaced by the next rendered argument.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct LogEntry {
    pub format: String,
    pub items: Vec<LogItem>,
}

impl LogEntry {
    pub fn new(format: impl Into<String>, items: Vec<LogItem>) -> Self {
        LogEntry {
            format: format.into(),
            items,
        }
    }

    /// Substitutes the current values of `solution` into the template.
    pub(crate) fn render<F: CurveField>(&self, solution: &Solution<'_, F>) -> String {
        let mut args = Vec::with_capacity(self.items.len());
        for item in self.items.iter() {
            match item {
                LogItem::Term(t) => render_term(t, solution, &mut args),
                LogItem::Eval(expr) => args.push(render_eval(expr, solution)),
            }
        }
        interpolate(&self.format, &args)
    }
}

fn render_term<F: CurveField>(t: &Term, solution: &Solution<'_, F>, args: &mut Vec<String>) {
    let coeffs = solution.coefficients();
    if t.is_constant() {
        args.push(coeff_to_string(coeffs.get(t.coeff), t.coeff));
        return;
    }
    if !(t.coeff == CoeffId::ONE || t.coeff == CoeffId::MINUS_ONE) {
        args.push(coeff_to_string(coeffs.get(t.coeff), t.coeff));
    }
    if solution.is_solved(t.wire()) {
        args.push(field_to_string(&solution.value(t.wire())));
    } else {
        args.push(UNSOLVED.to_string());
    }
}

fn render_eval<F: CurveField>(expr: &LinearExpression, solution: &Solution<'_, F>) -> String {
    let mut sum = F::zero();
    for t in expr.iter() {
        if !solution.is_resolved(t) {
            return UNSOLVED.to_string();
        }
        sum += solution.compute_term(t);
    }
    field_to_string(&sum)
}

fn coeff_to_string<F: PrimeField>(value: F, id: CoeffId) -> String {
    if id == CoeffId::MINUS_ONE {
        return "-1".to_string();
    }
    field_to_string(&value)
}

/// Canonical decimal form of a field element.
pub fn field_to_string<F: PrimeField>(value: &F) -> String {
    if value.is_zero() {
        return "0".to_string();
    }
    let n: BigUint = (*value).into();
    n.to_string()
}

fn interpolate(format: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(format.len() + args.len() * 8);
    let mut args = args.iter();
    let mut pieces = format.split("{}");
    if let Some(first) = pieces.next() {
        out.push_str(first);
    }
    for piece in pieces {
        match args.next() {
            Some(arg) => out.push_str(arg),
            None => out.push_str("{}"),
        }
        out.push_str(piece);
    }
    for extra in args {
        out.push(' ');
        out.push_str(extra);
    }
    out
}

/// Where rendered logs go.
#[derive(Clone, Default)]
pub enum LogSink {
    #[default]
    Discard,
    Stdout,
    Writer(Arc<Mutex<dyn Write + Send>>),
}

impl LogSink {
    pub fn writer<W: Write + Send + 'static>(w: W) -> Self {
        LogSink::Writer(Arc::new(Mutex::new(w)))
    }

    pub fn is_discard(&self) -> bool {
        matches!(self, LogSink::Discard)
    }

    /// Writes one line per entry. I/O failures are dropped: logging never fails a solve.
    fn write_lines(&self, lines: impl Iterator<Item = String>) {
        match self {
            LogSink::Discard => {}
            LogSink::Stdout => {
                let mut out = io::stdout().lock();
                for line in lines {
                    let _ = writeln!(out, "{line}");
                }
            }
            LogSink::Writer(w) => {
                let Ok(mut out) = w.lock() else {
                    return;
                };
                for line in lines {
                    let _ = writeln!(out, "{line}");
                }
                let _ = out.flush();
            }
        }
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSink::Discard => f.write_str("Discard"),
            LogSink::Stdout => f.write_str("Stdout"),
            LogSink::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

/// Owns the solution of one solve and renders the logs into the sink when dropped, whichever
/// way the solve exits.
pub(crate) struct LogFlush<'a, F: CurveField> {
    solution: Solution<'a, F>,
    logs: &'a [LogEntry],
    sink: &'a LogSink,
}

impl<'a, F: CurveField> LogFlush<'a, F> {
    pub(crate) fn new(solution: Solution<'a, F>, logs: &'a [LogEntry], sink: &'a LogSink) -> Self {
        LogFlush {
            solution,
            logs,
            sink,
        }
    }
}

impl<'a, F: CurveField> Deref for LogFlush<'a, F> {
    type Target = Solution<'a, F>;

    fn deref(&self) -> &Self::Target {
        &self.solution
    }
}

impl<'a, F: CurveField> DerefMut for LogFlush<'a, F> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.solution
    }
}

impl<F: CurveField> Drop for LogFlush<'_, F> {
    fn drop(&mut self) {
        if self.sink.is_discard() || self.logs.is_empty() {
            return;
        }
        let solution = &self.solution;
        self.sink
            .write_lines(self.logs.iter().map(|entry| entry.render(solution)));
    }
}
