//! Small reference circuits shared by the unit tests.

use crate::{
    constraint_system::R1CSBuilder,
    curve::CurveField,
    debug::{LogEntry, LogItem},
    hint::IthBit,
    linear_combination::{LinearExpression, Term},
    Circuit, R1CS,
};

/// `x * x = y` with `x` public.
pub fn square<F: CurveField>() -> R1CS<F> {
    let mut cs = R1CSBuilder::new();
    let x = cs.new_instance();
    let y = cs.new_internal();
    cs.constrain(x, x, y);
    cs.build()
}

/// `x * x = y`, then asserts `y = value`.
pub fn square_asserting<F: CurveField>(value: F) -> R1CS<F> {
    let mut cs = R1CSBuilder::new();
    let x = cs.new_instance();
    let y = cs.new_internal();
    cs.constrain(x, x, y);

    let v = cs.coeff(value);
    let one = cs.one();
    cs.constrain(Term::new(one, v), one, y);
    cs.push_debug_info(LogEntry::new(
        "y == {} failed: y = {}",
        vec![LogItem::Term(Term::constant(v)), LogItem::Term(y.into())],
    ));
    cs.build()
}

/// The CubicCircuit, which derived from [Vitalik Buterin](https://vitalik.ca/general/2016/12/10/qap.html),
/// defines the equation y = x^3 + x + 5.
pub struct CubicCircuit;

impl<F: CurveField> Circuit<F> for CubicCircuit {
    fn synthesize(&self, cs: &mut R1CSBuilder<F>) {
        let out = cs.new_instance();
        let x = cs.new_witness();
        let sym1 = cs.new_internal();
        let y = cs.new_internal();
        let sym2 = cs.new_internal();
        let one = cs.one();
        let five = cs.constant(F::from(5u8));

        cs.constrain(x, x, sym1);
        cs.constrain(sym1, x, y);
        cs.constrain(y + x, one, sym2);
        cs.constrain(sym2 + five, one, out);

        cs.push_debug_info(LogEntry::new(
            "x^3 + x + 5 = {}, expected {}",
            vec![
                LogItem::Eval(LinearExpression::from(sym2) + five),
                LogItem::Term(out.into()),
            ],
        ));
    }
}

/// Witness layout: `[out | x]`.
pub fn cubic<F: CurveField>() -> R1CS<F> {
    let mut cs = R1CSBuilder::new();
    CubicCircuit.synthesize(&mut cs);
    cs.build()
}

/// `x * inv = 1`, then `x * inv = k`. Witness layout: `[x, k]`.
pub fn inverse<F: CurveField>() -> R1CS<F> {
    let mut cs = R1CSBuilder::new();
    let x = cs.new_instance();
    let k = cs.new_instance();
    let inv = cs.new_internal();
    let one = cs.one();

    cs.constrain(x, inv, one);
    cs.push_debug_info(LogEntry::new(
        "inverse of {}",
        vec![LogItem::Term(x.into())],
    ));
    cs.constrain(x, inv, k);
    cs.push_debug_info(LogEntry::new(
        "expected x * inv = {}, x = {}, inv = {}",
        vec![
            LogItem::Term(k.into()),
            LogItem::Term(x.into()),
            LogItem::Term(inv.into()),
        ],
    ));
    cs.build()
}

/// Decomposes the public `x` into `n` hinted bits. The recomposition constraint comes first, so
/// the bits are hinted while summing.
pub fn bits<F: CurveField>(n: usize) -> R1CS<F> {
    let mut cs = R1CSBuilder::new();
    let x = cs.new_instance();
    let one = cs.one();

    let mut recomposed = LinearExpression::default();
    let mut bits = Vec::with_capacity(n);
    for i in 0..n {
        let b = cs.new_internal();
        let index = cs.coeff(F::from(i as u64));
        cs.hint(b, IthBit::ID, vec![x.into(), Term::constant(index).into()]);
        recomposed = recomposed + cs.term(b, F::from(1u64 << i));
        bits.push(b);
    }

    cs.constrain(recomposed, one, x);
    cs.push_debug_info(LogEntry::new(
        "{} does not fit in the bits",
        vec![LogItem::Term(x.into())],
    ));
    for b in bits {
        cs.constrain(b, b, b);
    }
    cs.build()
}
