use std::collections::HashMap;

use crate::coefficients::{CoeffId, CoeffTable, CoeffTableBuilder};
use crate::curve::{CurveField, CurveId};
use crate::debug::{LogEntry, LogItem, LogSink};
use crate::hint::HintId;
use crate::linear_combination::{LinearExpression, Term, Variable, Visibility, WireId};

/// A rank-1 constraint `L * R = O`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct R1C {
    pub l: LinearExpression,
    pub r: LinearExpression,
    pub o: LinearExpression,
}

impl R1C {
    pub fn new(
        l: impl Into<LinearExpression>,
        r: impl Into<LinearExpression>,
        o: impl Into<LinearExpression>,
    ) -> Self {
        R1C {
            l: l.into(),
            r: r.into(),
            o: o.into(),
        }
    }
}

/// Binds `wire` to the hint function `id`, evaluated on `inputs`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Hint {
    pub wire: WireId,
    pub id: HintId,
    pub inputs: Vec<LinearExpression>,
}

/// The field-independent output of the circuit compiler.
///
/// Wires are laid out as `[public | secret | internal]`; the public count includes wire 0, the
/// constant one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompiledR1CS {
    pub nb_public_variables: usize,
    pub nb_secret_variables: usize,
    pub nb_internal_variables: usize,
    pub constraints: Vec<R1C>,
    pub hints: Vec<Hint>,
    /// Traces for failing constraints, one per constraint solved by a division, in order.
    pub debug_info: Vec<LogEntry>,
    pub logs: Vec<LogEntry>,
}

impl CompiledR1CS {
    pub fn nb_wires(&self) -> usize {
        self.nb_public_variables + self.nb_secret_variables + self.nb_internal_variables
    }
}

/// A compiled constraint system over the scalar field `F`, ready to be solved.
#[derive(Clone, Debug)]
pub struct R1CS<F: CurveField> {
    pub(crate) cs: CompiledR1CS,
    pub(crate) coefficients: CoeffTable<F>,
    // wire -> position in cs.hints; rebuilt from the hint list, never encoded
    pub(crate) hint_index: HashMap<WireId, usize>,
    pub(crate) logger: LogSink,
}

/// Maps each hinted wire to its binding, or returns the first wire bound twice.
pub(crate) fn index_hints(hints: &[Hint]) -> Result<HashMap<WireId, usize>, WireId> {
    let mut index = HashMap::with_capacity(hints.len());
    for (i, hint) in hints.iter().enumerate() {
        if index.insert(hint.wire, i).is_some() {
            return Err(hint.wire);
        }
    }
    Ok(index)
}

impl<F: CurveField> R1CS<F> {
    /// # Panics
    ///
    /// If a wire is bound to more than one hint.
    pub fn new(cs: CompiledR1CS, coefficients: CoeffTable<F>) -> Self {
        let hint_index = match index_hints(&cs.hints) {
            Ok(index) => index,
            Err(wire) => panic!("wire {wire} is bound to more than one hint"),
        };
        R1CS {
            cs,
            coefficients,
            hint_index,
            logger: LogSink::default(),
        }
    }

    pub fn compiled(&self) -> &CompiledR1CS {
        &self.cs
    }

    pub fn coefficients(&self) -> &CoeffTable<F> {
        &self.coefficients
    }

    pub fn constraints(&self) -> &[R1C] {
        &self.cs.constraints
    }

    pub fn nb_constraints(&self) -> usize {
        self.cs.constraints.len()
    }

    pub fn nb_wires(&self) -> usize {
        self.cs.nb_wires()
    }

    /// Number of unique coefficients in the table.
    pub fn nb_coefficients(&self) -> usize {
        self.coefficients.len()
    }

    /// Size in bytes of one field element.
    pub fn fr_size(&self) -> usize {
        F::byte_size()
    }

    pub fn curve_id(&self) -> CurveId {
        F::CURVE_ID
    }

    /// The hint bound to `wire`, if any.
    pub fn hint_for(&self, wire: WireId) -> Option<&Hint> {
        self.hint_index.get(&wire).map(|i| &self.cs.hints[*i])
    }

    pub fn logger_output(&self) -> &LogSink {
        &self.logger
    }

    /// Replaces where logs are written. Defaults to [`LogSink::Discard`].
    pub fn set_logger_output(&mut self, sink: LogSink) {
        self.logger = sink;
    }
}

impl<F: CurveField> PartialEq for R1CS<F> {
    fn eq(&self, other: &Self) -> bool {
        self.cs == other.cs && self.coefficients == other.coefficients
    }
}

impl<F: CurveField> Eq for R1CS<F> {}

/// Assembles an [`R1CS`] by hand.
///
/// Variables are numbered per visibility class while building; [`R1CSBuilder::build`] moves
/// them to their final `[public | secret | internal]` positions.
pub struct R1CSBuilder<F: CurveField> {
    coefficients: CoeffTableBuilder<F>,
    nb_public: usize,
    nb_secret: usize,
    nb_internal: usize,
    constraints: Vec<R1C>,
    hints: Vec<Hint>,
    debug_info: Vec<LogEntry>,
    logs: Vec<LogEntry>,
}

impl<F: CurveField> R1CSBuilder<F> {
    pub fn new() -> Self {
        R1CSBuilder {
            coefficients: CoeffTableBuilder::new(),
            nb_public: 1,
            nb_secret: 0,
            nb_internal: 0,
            constraints: vec![],
            hints: vec![],
            debug_info: vec![],
            logs: vec![],
        }
    }

    pub fn one(&self) -> Variable {
        Variable::ONE
    }

    /// Allocates a public wire.
    pub fn new_instance(&mut self) -> Variable {
        let index = self.nb_public;
        self.nb_public += 1;
        Variable::new(index, Visibility::Public)
    }

    /// Allocates a secret wire.
    pub fn new_witness(&mut self) -> Variable {
        let index = self.nb_secret;
        self.nb_secret += 1;
        Variable::new(index, Visibility::Secret)
    }

    /// Allocates a wire computed by the solver.
    pub fn new_internal(&mut self) -> Variable {
        let index = self.nb_internal;
        self.nb_internal += 1;
        Variable::new(index, Visibility::Internal)
    }

    pub fn coeff(&mut self, value: F) -> CoeffId {
        self.coefficients.get_or_insert(value)
    }

    /// `value * var`
    pub fn term(&mut self, var: Variable, value: F) -> Term {
        Term::new(var, self.coeff(value))
    }

    /// `value * ONE`
    pub fn constant(&mut self, value: F) -> Term {
        Term::new(Variable::ONE, self.coeff(value))
    }

    pub fn constrain(
        &mut self,
        l: impl Into<LinearExpression>,
        r: impl Into<LinearExpression>,
        o: impl Into<LinearExpression>,
    ) {
        self.constraints.push(R1C::new(l, r, o));
    }

    /// Binds the internal wire `target` to the hint function `id`.
    pub fn hint(&mut self, target: Variable, id: HintId, inputs: Vec<LinearExpression>) {
        assert_eq!(
            target.visibility,
            Visibility::Internal,
            "only internal wires can be computed by a hint"
        );
        self.hints.push(Hint {
            wire: target.id,
            id,
            inputs,
        });
    }

    pub fn push_debug_info(&mut self, entry: LogEntry) {
        self.debug_info.push(entry);
    }

    pub fn push_log(&mut self, entry: LogEntry) {
        self.logs.push(entry);
    }

    pub fn build(self) -> R1CS<F> {
        let layout = Layout {
            nb_public: self.nb_public,
            nb_secret: self.nb_secret,
        };

        let constraints = self
            .constraints
            .iter()
            .map(|r1c| R1C {
                l: layout.expr(&r1c.l),
                r: layout.expr(&r1c.r),
                o: layout.expr(&r1c.o),
            })
            .collect();
        let hints = self
            .hints
            .iter()
            .map(|h| Hint {
                wire: layout.wire(Variable::new(h.wire, Visibility::Internal)),
                id: h.id,
                inputs: h.inputs.iter().map(|e| layout.expr(e)).collect(),
            })
            .collect();

        let cs = CompiledR1CS {
            nb_public_variables: self.nb_public,
            nb_secret_variables: self.nb_secret,
            nb_internal_variables: self.nb_internal,
            constraints,
            hints,
            debug_info: self.debug_info.iter().map(|e| layout.entry(e)).collect(),
            logs: self.logs.iter().map(|e| layout.entry(e)).collect(),
        };

        R1CS::new(cs, self.coefficients.build())
    }
}

impl<F: CurveField> Default for R1CSBuilder<F> {
    fn default() -> Self {
        Self::new()
    }
}

struct Layout {
    nb_public: usize,
    nb_secret: usize,
}

impl Layout {
    fn wire(&self, v: Variable) -> WireId {
        match v.visibility {
            Visibility::Public => v.id,
            Visibility::Secret => v.id + self.nb_public,
            Visibility::Internal => v.id + self.nb_public + self.nb_secret,
            Visibility::Virtual | Visibility::Unset => v.id,
        }
    }

    fn term(&self, t: &Term) -> Term {
        Term::new(
            Variable::new(self.wire(t.variable), t.variable.visibility),
            t.coeff,
        )
    }

    fn expr(&self, e: &LinearExpression) -> LinearExpression {
        e.iter().map(|t| self.term(t)).collect::<Vec<_>>().into()
    }

    fn entry(&self, e: &LogEntry) -> LogEntry {
        let items = e
            .items
            .iter()
            .map(|item| match item {
                LogItem::Term(t) => LogItem::Term(self.term(t)),
                LogItem::Eval(expr) => LogItem::Eval(self.expr(expr)),
            })
            .collect();
        LogEntry::new(e.format.clone(), items)
    }
}
