//! Hint functions.
//!
//! Some wires cannot be derived by inverting a single constraint (bit decompositions, inverses
//! of possibly-zero values, ...). The compiler binds those wires to a hint: a function evaluated
//! on the prover side from already-solved inputs. The solver looks the function up by [`HintId`]
//! in the [`HintFunctions`] set supplied by the caller.

use std::{collections::HashMap, fmt, sync::Arc};

use anyhow::{bail, Context};
use num_bigint::BigUint;

use crate::curve::CurveId;

/// Stable identifier of a hint function.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HintId(pub u32);

impl HintId {
    /// Derives an identifier from a function name (32-bit FNV-1a).
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash: u32 = 0x811c_9dc5;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u32;
            hash = hash.wrapping_mul(0x0100_0193);
            i += 1;
        }
        HintId(hash)
    }
}

impl fmt::Display for HintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// A function computing one wire from the values of its inputs.
///
/// Inputs are the canonical (non-Montgomery) integers of the field values; the output is reduced
/// into the field by the solver.
pub trait HintFunction: Send + Sync {
    fn id(&self) -> HintId;

    fn call(&self, curve: CurveId, inputs: &[BigUint]) -> anyhow::Result<BigUint>;
}

struct FnHint<H> {
    id: HintId,
    f: H,
}

impl<H> HintFunction for FnHint<H>
where
    H: Fn(CurveId, &[BigUint]) -> anyhow::Result<BigUint> + Send + Sync,
{
    fn id(&self) -> HintId {
        self.id
    }

    fn call(&self, curve: CurveId, inputs: &[BigUint]) -> anyhow::Result<BigUint> {
        (self.f)(curve, inputs)
    }
}

/// The set of hint functions available to a solve.
#[derive(Clone, Default)]
pub struct HintFunctions {
    functions: HashMap<HintId, Arc<dyn HintFunction>>,
}

impl HintFunctions {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding the built-in hints.
    pub fn with_builtins() -> Self {
        let mut hints = Self::new();
        hints.register(IsZero);
        hints.register(IthBit);
        hints
    }

    /// Adds `hint`, replacing any function registered under the same ID.
    pub fn register<H: HintFunction + 'static>(&mut self, hint: H) -> HintId {
        let id = hint.id();
        self.functions.insert(id, Arc::new(hint));
        id
    }

    pub fn register_fn<H>(&mut self, id: HintId, f: H) -> HintId
    where
        H: Fn(CurveId, &[BigUint]) -> anyhow::Result<BigUint> + Send + Sync + 'static,
    {
        self.register(FnHint { id, f })
    }

    pub fn get(&self, id: HintId) -> Option<&dyn HintFunction> {
        self.functions.get(&id).map(|f| f.as_ref())
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for HintFunctions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.functions.keys().collect();
        ids.sort();
        f.debug_struct("HintFunctions").field("ids", &ids).finish()
    }
}

fn expect_inputs(inputs: &[BigUint], n: usize) -> anyhow::Result<()> {
    if inputs.len() != n {
        bail!("expected {n} inputs, got {}", inputs.len());
    }
    Ok(())
}

/// `1` if the input is zero, `0` otherwise.
pub struct IsZero;

impl IsZero {
    pub const ID: HintId = HintId::from_name("is_zero");
}

impl HintFunction for IsZero {
    fn id(&self) -> HintId {
        Self::ID
    }

    fn call(&self, _curve: CurveId, inputs: &[BigUint]) -> anyhow::Result<BigUint> {
        expect_inputs(inputs, 1)?;
        Ok(BigUint::from((inputs[0].bits() == 0) as u8))
    }
}

/// Bit `i` of the first input, with `i` given as the second input.
pub struct IthBit;

impl IthBit {
    pub const ID: HintId = HintId::from_name("ith_bit");
}

impl HintFunction for IthBit {
    fn id(&self) -> HintId {
        Self::ID
    }

    fn call(&self, _curve: CurveId, inputs: &[BigUint]) -> anyhow::Result<BigUint> {
        expect_inputs(inputs, 2)?;
        let i = u64::try_from(&inputs[1]).context("bit index does not fit in 64 bits")?;
        let bit = (&inputs[0] >> i) & BigUint::from(1u8);
        Ok(bit)
    }
}

#[cfg(test)]
mod tests {
    use super::{HintFunctions, HintId, IsZero, IthBit};
    use crate::curve::CurveId;
    use num_bigint::BigUint;

    #[test]
    fn test_hint_id_is_stable() {
        assert_eq!(HintId::from_name(""), HintId(0x811c_9dc5));
        assert_eq!(HintId::from_name("a"), HintId(0xe40c_292c));
        assert_ne!(IsZero::ID, IthBit::ID);
    }

    #[test]
    fn test_builtins() {
        let hints = HintFunctions::with_builtins();
        let curve = CurveId::Bn254;

        let is_zero = hints.get(IsZero::ID).unwrap();
        assert_eq!(is_zero.call(curve, &[BigUint::from(0u8)]).unwrap(), BigUint::from(1u8));
        assert_eq!(is_zero.call(curve, &[BigUint::from(9u8)]).unwrap(), BigUint::from(0u8));
        assert!(is_zero.call(curve, &[]).is_err());

        let ith_bit = hints.get(IthBit::ID).unwrap();
        let v = BigUint::from(0b1011u8);
        let bits: Vec<_> = (0u8..5)
            .map(|i| ith_bit.call(curve, &[v.clone(), BigUint::from(i)]).unwrap())
            .collect();
        let expected: Vec<_> = [1u8, 1, 0, 1, 0].into_iter().map(BigUint::from).collect();
        assert_eq!(bits, expected);
    }

    #[test]
    fn test_register_fn() {
        let mut hints = HintFunctions::new();
        let id = hints.register_fn(HintId::from_name("double"), |_, inputs| Ok(&inputs[0] * 2u8));
        assert_eq!(hints.len(), 1);
        let out = hints.get(id).unwrap().call(CurveId::Bls12_381, &[BigUint::from(21u8)]);
        assert_eq!(out.unwrap(), BigUint::from(42u8));
        assert!(hints.get(IsZero::ID).is_none());
    }
}
