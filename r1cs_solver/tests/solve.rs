use std::sync::{Arc, Mutex};

use ark_ff::{Field, PrimeField, Zero};
use num_bigint::BigUint;
use proptest::prelude::*;
use r1cs_solver::{
    hint::IthBit, Circuit, CurveField, CurveId, Error, HintFunctions, HintId, LinearExpression,
    LogEntry, LogItem, LogSink, R1CSBuilder, Term, R1CS,
};

/// y = x^3 + x + 5, with `y` public and `x` secret.
struct Cubic;

impl<F: CurveField> Circuit<F> for Cubic {
    fn synthesize(&self, cs: &mut R1CSBuilder<F>) {
        let y = cs.new_instance();
        let x = cs.new_witness();
        let x2 = cs.new_internal();
        let x3 = cs.new_internal();
        let one = cs.one();
        let five = cs.constant(F::from(5u8));

        cs.constrain(x, x, x2);
        cs.constrain(x2, x, x3);
        cs.constrain(LinearExpression::from(x3) + x + five, one, y);
        cs.push_debug_info(LogEntry::new(
            "y = {} but x^3 + x + 5 = {}",
            vec![
                LogItem::Term(y.into()),
                LogItem::Eval(LinearExpression::from(x3) + x + five),
            ],
        ));
        cs.push_log(LogEntry::new("x^3 = {}", vec![LogItem::Term(x3.into())]));
    }
}

fn build<F: CurveField, C: Circuit<F>>(circuit: &C) -> R1CS<F> {
    let mut cs = R1CSBuilder::new();
    circuit.synthesize(&mut cs);
    cs.build()
}

/// Public `x` split into `n` hinted bits, each constrained to be boolean.
fn decompose<F: CurveField>(n: usize) -> R1CS<F> {
    let mut cs = R1CSBuilder::new();
    let x = cs.new_instance();
    let one = cs.one();

    let mut sum = LinearExpression::default();
    let mut bits = vec![];
    for i in 0..n {
        let b = cs.new_internal();
        let index = cs.constant(F::from(i as u64));
        cs.hint(b, IthBit::ID, vec![x.into(), index.into()]);
        sum = sum + cs.term(b, F::from(2u64).pow([i as u64]));
        bits.push(b);
    }
    for b in bits {
        cs.constrain(b, b, b);
    }
    cs.constrain(sum, one, x);
    let n = Term::constant(cs.coeff(F::from(n as u64)));
    cs.push_debug_info(LogEntry::new(
        "{} has more than {} bits",
        vec![LogItem::Term(x.into()), LogItem::Term(n)],
    ));
    cs.build()
}

const INVERSE: HintId = HintId::from_name("inverse");

fn modulus(curve: CurveId) -> BigUint {
    match curve {
        CurveId::Bn254 => ark_bn254::Fr::MODULUS.into(),
        CurveId::Bls12_377 => ark_bls12_377::Fr::MODULUS.into(),
        CurveId::Bls12_381 => ark_bls12_381::Fr::MODULUS.into(),
    }
}

fn with_inverse() -> HintFunctions {
    let mut hints = HintFunctions::with_builtins();
    hints.register_fn(INVERSE, |curve, inputs| {
        let p = modulus(curve);
        anyhow::ensure!(inputs[0] != BigUint::default(), "zero has no inverse");
        Ok(inputs[0].modpow(&(&p - BigUint::from(2u8)), &p))
    });
    hints
}

/// `x * inv = 1` where `inv` comes from a hint.
fn inverse<F: CurveField>() -> R1CS<F> {
    let mut cs = R1CSBuilder::new();
    let x = cs.new_instance();
    let inv = cs.new_internal();
    let one = cs.one();
    cs.hint(inv, INVERSE, vec![x.into()]);
    cs.constrain(x, inv, one);
    cs.build()
}

fn check_cubic<F: CurveField>(x: u64) {
    let r1cs = build::<F, _>(&Cubic);
    let x = F::from(x);
    let y = x * x * x + x + F::from(5u8);

    let n = r1cs.nb_constraints();
    let (mut a, mut b, mut c) = (vec![F::zero(); n], vec![F::zero(); n], vec![F::zero(); n]);
    let wires = r1cs
        .solve(&[y, x], &mut a, &mut b, &mut c, &HintFunctions::new())
        .unwrap();

    assert_eq!(wires, vec![y, x, x * x, x * x * x]);
    for i in 0..n {
        assert_eq!(a[i] * b[i], c[i]);
    }
}

proptest! {
    #[test]
    fn prop_cubic(x in any::<u64>()) {
        check_cubic::<ark_bn254::Fr>(x);
        check_cubic::<ark_bls12_377::Fr>(x);
        check_cubic::<ark_bls12_381::Fr>(x);
    }

    #[test]
    fn prop_cubic_wrong_output(x in any::<u64>(), delta in 1u64..) {
        type F = ark_bls12_381::Fr;
        let r1cs = build::<F, _>(&Cubic);
        let x = F::from(x);
        let y = x * x * x + x + F::from(5u8) + F::from(delta);

        let err = r1cs.is_solved(&[y, x], &HintFunctions::new()).unwrap_err();
        prop_assert!(matches!(err, Error::UnsatisfiedConstraint { constraint: 2, .. }), "{err}");
    }

    #[test]
    fn prop_bit_decomposition(x in any::<u32>()) {
        type F = ark_bn254::Fr;
        let r1cs = decompose::<F>(32);
        let n = r1cs.nb_constraints();
        let (mut a, mut b, mut c) = (vec![F::zero(); n], vec![F::zero(); n], vec![F::zero(); n]);
        let wires = r1cs
            .solve(&[F::from(x)], &mut a, &mut b, &mut c, &HintFunctions::with_builtins())
            .unwrap();

        for (i, bit) in wires[1..].iter().enumerate() {
            prop_assert_eq!(*bit, F::from((x >> i) & 1));
        }
    }

    #[test]
    fn prop_bits_overflow(x in (1u64 << 8)..) {
        type F = ark_bn254::Fr;
        let r1cs = decompose::<F>(8);
        match r1cs.is_solved(&[F::from(x)], &HintFunctions::with_builtins()) {
            Err(Error::UnsatisfiedConstraint { constraint, debug }) => {
                prop_assert_eq!(constraint, 8);
                prop_assert_eq!(debug, format!("{x} has more than 8 bits"));
            }
            other => prop_assert!(false, "unexpected result {:?}", other),
        }
    }

    #[test]
    fn prop_inverse_hint(x in 1u64..) {
        type F = ark_bls12_377::Fr;
        let r1cs = inverse::<F>();
        let n = r1cs.nb_constraints();
        let (mut a, mut b, mut c) = (vec![F::zero(); n], vec![F::zero(); n], vec![F::zero(); n]);
        let wires = r1cs
            .solve(&[F::from(x)], &mut a, &mut b, &mut c, &with_inverse())
            .unwrap();
        prop_assert_eq!(wires[1], F::from(x).inverse().unwrap());
    }

    #[test]
    fn prop_decoded_solves_alike(x in any::<u16>()) {
        type F = ark_bn254::Fr;
        let r1cs = decompose::<F>(16);
        let mut bytes = vec![];
        let written = r1cs.write_to(&mut bytes).unwrap();
        let (decoded, read) = R1CS::<F>::read_from(&bytes[..]).unwrap();
        prop_assert_eq!(written, read);

        let hints = HintFunctions::with_builtins();
        let n = r1cs.nb_constraints();
        let mut outputs = vec![];
        for r1cs in [&r1cs, &decoded] {
            let (mut a, mut b, mut c) = (vec![F::zero(); n], vec![F::zero(); n], vec![F::zero(); n]);
            let wires = r1cs
                .solve(&[F::from(x)], &mut a, &mut b, &mut c, &hints)
                .unwrap();
            outputs.push((wires, a, b, c));
        }
        prop_assert_eq!(&outputs[0], &outputs[1]);
    }
}

#[test]
fn test_failing_hint() {
    type F = ark_bn254::Fr;
    let r1cs = inverse::<F>();
    match r1cs.is_solved(&[F::zero()], &with_inverse()) {
        Err(Error::HintResolutionFailed { wire, source }) => {
            assert_eq!(wire, 2);
            assert!(source.to_string().contains("zero has no inverse"));
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn test_logs_to_writer() {
    type F = ark_bn254::Fr;
    let mut r1cs = build::<F, _>(&Cubic);
    let buf = Arc::new(Mutex::new(Vec::<u8>::new()));
    r1cs.set_logger_output(LogSink::Writer(buf.clone()));

    let x = F::from(3u8);
    r1cs.is_solved(&[F::from(35u8), x], &HintFunctions::new())
        .unwrap();
    // a failing solve still flushes the logs
    assert!(r1cs
        .is_solved(&[F::from(36u8), x], &HintFunctions::new())
        .is_err());

    let out = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
    assert_eq!(out, "x^3 = 27\nx^3 = 27\n");
}

#[test]
fn test_wrong_witness_size() {
    type F = ark_bls12_381::Fr;
    let r1cs = build::<F, _>(&Cubic);
    let err = r1cs.is_solved(&[F::zero()], &HintFunctions::new()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid witness size, got 1, expected 2 = 1 (public - ONE_WIRE) + 1 (secret)"
    );
}

#[test]
fn test_constant_term() {
    type F = ark_bn254::Fr;
    let mut cs = R1CSBuilder::<F>::new();
    let x = cs.new_instance();
    let y = cs.new_internal();
    let three = cs.coeff(F::from(3u8));
    // (x + 3) * 1 = y
    cs.constrain(LinearExpression::from(x) + Term::constant(three), cs.one(), y);
    let r1cs = cs.build();

    let mut a = vec![F::zero()];
    let (mut b, mut c) = (a.clone(), a.clone());
    let wires = r1cs
        .solve(&[F::from(4u8)], &mut a, &mut b, &mut c, &HintFunctions::new())
        .unwrap();
    assert_eq!(wires, vec![F::from(4u8), F::from(7u8)]);
}
