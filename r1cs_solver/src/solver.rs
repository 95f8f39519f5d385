//! Witness solving.
//!
//! Constraints are visited in their stored order. The compiler guarantees that when a constraint
//! is reached, at most one of its wires is neither solved nor computable by a hint; that wire is
//! isolated algebraically, then the whole constraint is evaluated and checked.

use num_bigint::BigUint;

use crate::coefficients::CoeffTable;
use crate::constraint_system::{Hint, R1CS, R1C};
use crate::curve::CurveField;
use crate::debug::LogFlush;
use crate::error::{Error, HintError};
use crate::hint::HintFunctions;
use crate::linear_combination::{LinearExpression, Term, WireId};

/// Wire assignment of one solve.
pub(crate) struct Solution<'a, F: CurveField> {
    values: Vec<F>,
    solved: Vec<bool>,
    nb_solved: usize,
    coefficients: &'a CoeffTable<F>,
    hint_functions: &'a HintFunctions,
}

impl<'a, F: CurveField> Solution<'a, F> {
    /// A solution where only wire 0 (the constant one) is known.
    pub(crate) fn new(
        nb_wires: usize,
        coefficients: &'a CoeffTable<F>,
        hint_functions: &'a HintFunctions,
    ) -> Self {
        let mut solution = Solution {
            values: vec![F::zero(); nb_wires],
            solved: vec![false; nb_wires],
            nb_solved: 0,
            coefficients,
            hint_functions,
        };
        solution.set(0, F::one());
        solution
    }

    pub(crate) fn set(&mut self, wire: WireId, value: F) {
        assert!(
            !self.solved[wire],
            "solving the same wire twice should never happen (wire {wire})"
        );
        self.values[wire] = value;
        self.solved[wire] = true;
        self.nb_solved += 1;
    }

    pub(crate) fn is_solved(&self, wire: WireId) -> bool {
        self.solved[wire]
    }

    pub(crate) fn value(&self, wire: WireId) -> F {
        self.values[wire]
    }

    pub(crate) fn values(&self) -> &[F] {
        &self.values
    }

    pub(crate) fn coefficients(&self) -> &CoeffTable<F> {
        self.coefficients
    }

    /// Whether the term has a value: a constant, or a solved wire.
    pub(crate) fn is_resolved(&self, t: &Term) -> bool {
        t.is_constant() || self.solved[t.wire()]
    }

    pub(crate) fn compute_term(&self, t: &Term) -> F {
        if t.is_constant() {
            return self.coefficients.get(t.coeff);
        }
        self.coefficients.term_value(t.coeff, &self.values[t.wire()])
    }

    fn eval(&self, expr: &LinearExpression) -> F {
        expr.iter().map(|t| self.compute_term(t)).sum()
    }

    /// All wires have been assigned.
    pub(crate) fn is_valid(&self) -> bool {
        self.nb_solved == self.values.len()
    }

    /// Evaluates the hint inputs, calls the hint function and assigns its output to the hinted
    /// wire.
    ///
    /// # Panics
    ///
    /// If an input references a wire that is not solved yet.
    pub(crate) fn solve_hint(&mut self, hint: &Hint) -> Result<(), HintError> {
        let f = self
            .hint_functions
            .get(hint.id)
            .ok_or(HintError::MissingFunction(hint.id))?;

        let mut inputs = Vec::with_capacity(hint.inputs.len());
        for input in hint.inputs.iter() {
            let mut value = F::zero();
            for t in input.iter() {
                assert!(
                    self.is_resolved(t),
                    "expected wire {} to be instantiated while evaluating hint {}",
                    t.wire(),
                    hint.id
                );
                value += self.compute_term(t);
            }
            let value: BigUint = value.into();
            inputs.push(value);
        }

        let result = f
            .call(F::CURVE_ID, &inputs)
            .map_err(|source| HintError::Failed {
                id: hint.id,
                source,
            })?;
        tracing::trace!(wire = hint.wire, id = %hint.id, "solved hint");
        self.set(hint.wire, F::from(result));
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Side {
    L = 0,
    R = 1,
    O = 2,
}

impl<F: CurveField> R1CS<F> {
    /// Computes every wire from the public and secret inputs and checks all constraints.
    ///
    /// `witness` is `[public | secret]` without the constant wire. `a`, `b`, `c` must be sized
    /// to the number of constraints and receive the evaluated `L`, `R`, `O` of each constraint.
    /// Returns the wires `[public | secret | internal]`, again without the constant wire.
    ///
    /// Logs of the system are rendered to its logger output when the solve returns, whether it
    /// succeeds or not.
    ///
    /// # Panics
    ///
    /// If the system is malformed: a constraint with two unknown wires, a wire left unsolved at
    /// the end, a missing debug trace for a failing constraint, or an out-of-range wire or
    /// coefficient.
    #[tracing::instrument(
        skip_all,
        fields(curve = %F::CURVE_ID, nb_constraints = self.nb_constraints(), nb_wires = self.nb_wires())
    )]
    pub fn solve(
        &self,
        witness: &[F],
        a: &mut [F],
        b: &mut [F],
        c: &mut [F],
        hint_functions: &HintFunctions,
    ) -> Result<Vec<F>, Error> {
        let public = self.cs.nb_public_variables - 1; // without ONE_WIRE
        let secret = self.cs.nb_secret_variables;
        if witness.len() != public + secret {
            return Err(Error::InvalidWitnessSize {
                got: witness.len(),
                expected: public + secret,
                public,
                secret,
            });
        }

        let nb_constraints = self.nb_constraints();
        if a.len() != nb_constraints || b.len() != nb_constraints || c.len() != nb_constraints {
            return Err(Error::InvalidOutputSize {
                a: a.len(),
                b: b.len(),
                c: c.len(),
                expected: nb_constraints,
            });
        }

        let mut solution = Solution::new(self.nb_wires(), &self.coefficients, hint_functions);
        for (i, w) in witness.iter().enumerate() {
            solution.set(i + 1, *w);
        }

        // from here on, logs are printed when `solution` goes out of scope
        let mut solution = LogFlush::new(solution, &self.cs.logs, &self.logger);

        // position in debug_info; moves by one for each constraint solved by a division
        let mut debug_info_offset = 0;

        for (i, r1c) in self.cs.constraints.iter().enumerate() {
            if self.solve_constraint(r1c, &mut solution)? {
                debug_info_offset += 1;
            }

            a[i] = solution.eval(&r1c.l);
            b[i] = solution.eval(&r1c.r);
            c[i] = solution.eval(&r1c.o);

            if a[i] * b[i] != c[i] {
                let Some(entry) = self.cs.debug_info.get(debug_info_offset) else {
                    panic!("no debug info at offset {debug_info_offset} for constraint #{i}");
                };
                let trace = entry.render(&solution);
                tracing::debug!(constraint = i, trace = %trace, "constraint not satisfied");
                return Err(Error::UnsatisfiedConstraint {
                    constraint: i,
                    debug: trace,
                });
            }
        }

        assert!(solution.is_valid(), "solver didn't instantiate all wires");

        Ok(solution.values()[1..].to_vec())
    }

    /// Returns `Ok(())` if `witness` satisfies the system.
    pub fn is_solved(&self, witness: &[F], hint_functions: &HintFunctions) -> Result<(), Error> {
        let n = self.nb_constraints();
        let mut a = vec![F::zero(); n];
        let mut b = vec![F::zero(); n];
        let mut c = vec![F::zero(); n];
        self.solve(witness, &mut a, &mut b, &mut c, hint_functions)
            .map(|_| ())
    }

    /// Solves the (at most one) unknown wire of `r1c`.
    ///
    /// Hinted wires are computed as they are met and count towards the sum of their side like
    /// any solved wire. Returns whether the unknown was obtained by a division.
    fn solve_constraint(&self, r1c: &R1C, solution: &mut Solution<'_, F>) -> Result<bool, Error> {
        let mut sums = [F::zero(); 3];
        let mut unknown: Option<(Side, Term)> = None;

        for (side, expr) in [(Side::L, &r1c.l), (Side::R, &r1c.r), (Side::O, &r1c.o)] {
            for t in expr.iter() {
                if !solution.is_resolved(t) {
                    if let Some(&h) = self.hint_index.get(&t.wire()) {
                        solution
                            .solve_hint(&self.cs.hints[h])
                            .map_err(|source| Error::HintResolutionFailed {
                                wire: t.wire(),
                                source,
                            })?;
                    } else {
                        assert!(
                            unknown.is_none(),
                            "found more than one wire to instantiate"
                        );
                        unknown = Some((side, *t));
                        continue;
                    }
                }
                sums[side as usize] += solution.compute_term(t);
            }
        }

        // nothing to solve: an assertion, or every unknown came from a hint
        let Some((side, t)) = unknown else {
            return Ok(false);
        };

        let [l, r, o] = sums;
        let mut wire = F::zero();
        let mut division = false;
        match side {
            Side::L => {
                if !r.is_zero() {
                    wire = o / r - l;
                    division = true;
                }
            }
            Side::R => {
                if !l.is_zero() {
                    wire = o / l - r;
                    division = true;
                }
            }
            Side::O => wire = l * r - o,
        }
        self.coefficients.divide(&mut wire, t.coeff);
        solution.set(t.wire(), wire);

        Ok(division)
    }
}
