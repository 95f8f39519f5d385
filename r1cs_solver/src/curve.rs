use ark_ff::{BigInteger, PrimeField};
use ark_std::fmt;

/// Identifies the curve whose scalar field a constraint system is defined over.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CurveId {
    Bn254,
    Bls12_377,
    Bls12_381,
}

impl CurveId {
    /// Tag used in the binary encoding.
    pub fn to_u8(self) -> u8 {
        match self {
            CurveId::Bn254 => 1,
            CurveId::Bls12_377 => 2,
            CurveId::Bls12_381 => 3,
        }
    }

    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(CurveId::Bn254),
            2 => Some(CurveId::Bls12_377),
            3 => Some(CurveId::Bls12_381),
            _ => None,
        }
    }
}

impl fmt::Display for CurveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CurveId::Bn254 => "bn254",
            CurveId::Bls12_377 => "bls12_377",
            CurveId::Bls12_381 => "bls12_381",
        };
        f.write_str(name)
    }
}

/// A prime field that is the scalar field of a known curve.
pub trait CurveField: PrimeField {
    const CURVE_ID: CurveId;

    /// Size in bytes of one element, i.e. `limbs * 8`.
    fn byte_size() -> usize {
        <Self::BigInt as BigInteger>::NUM_LIMBS * 8
    }
}

impl CurveField for ark_bn254::Fr {
    const CURVE_ID: CurveId = CurveId::Bn254;
}

impl CurveField for ark_bls12_377::Fr {
    const CURVE_ID: CurveId = CurveId::Bls12_377;
}

impl CurveField for ark_bls12_381::Fr {
    const CURVE_ID: CurveId = CurveId::Bls12_381;
}

#[cfg(test)]
mod tests {
    use super::{CurveField, CurveId};

    #[test]
    fn test_curve_tags() {
        for id in [CurveId::Bn254, CurveId::Bls12_377, CurveId::Bls12_381] {
            assert_eq!(CurveId::from_u8(id.to_u8()), Some(id));
        }
        assert_eq!(CurveId::from_u8(0), None);
    }

    #[test]
    fn test_byte_size() {
        assert_eq!(ark_bn254::Fr::byte_size(), 32);
        assert_eq!(ark_bls12_381::Fr::byte_size(), 32);
        assert_eq!(<ark_bls12_377::Fr as CurveField>::CURVE_ID, CurveId::Bls12_377);
    }
}
