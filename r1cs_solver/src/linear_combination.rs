use ark_std::ops::*;

use crate::coefficients::CoeffId;

/// Wire index
pub type WireId = usize;

/// Visibility class of a wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Visibility {
    Unset,
    Internal,
    Secret,
    Public,
    /// Not a wire: the term stands for its coefficient alone.
    Virtual,
}

impl Visibility {
    pub fn to_u8(self) -> u8 {
        match self {
            Visibility::Unset => 0,
            Visibility::Internal => 1,
            Visibility::Secret => 2,
            Visibility::Public => 3,
            Visibility::Virtual => 4,
        }
    }

    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Visibility::Unset),
            1 => Some(Visibility::Internal),
            2 => Some(Visibility::Secret),
            3 => Some(Visibility::Public),
            4 => Some(Visibility::Virtual),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Variable {
    pub id: WireId,
    pub visibility: Visibility,
}

impl Variable {
    /// The constant wire, always equal to one.
    pub const ONE: Variable = Variable {
        id: 0,
        visibility: Visibility::Public,
    };

    pub fn new(id: WireId, visibility: Visibility) -> Self {
        Variable { id, visibility }
    }
}

/// `coeff * variable`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Term {
    pub variable: Variable,
    pub coeff: CoeffId,
}

impl Term {
    pub fn new(variable: Variable, coeff: CoeffId) -> Self {
        Term { variable, coeff }
    }

    /// A term standing for the constant `coeff`, bound to no wire.
    pub fn constant(coeff: CoeffId) -> Self {
        Term {
            variable: Variable::new(0, Visibility::Virtual),
            coeff,
        }
    }

    #[inline]
    pub fn wire(&self) -> WireId {
        self.variable.id
    }

    #[inline]
    pub fn is_constant(&self) -> bool {
        self.variable.visibility == Visibility::Virtual
    }
}

impl From<Variable> for Term {
    fn from(v: Variable) -> Term {
        Term::new(v, CoeffId::ONE)
    }
}

impl<L: Into<LinearExpression>> Add<L> for Variable {
    type Output = LinearExpression;

    #[inline]
    fn add(self, rhs: L) -> Self::Output {
        LinearExpression::from(self) + rhs
    }
}

impl<L: Into<LinearExpression>> Add<L> for Term {
    type Output = LinearExpression;

    #[inline]
    fn add(self, rhs: L) -> Self::Output {
        LinearExpression::from(self) + rhs
    }
}

/// Ordered sum of terms.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct LinearExpression {
    pub terms: Vec<Term>,
}

impl LinearExpression {
    pub fn new(terms: Vec<Term>) -> Self {
        LinearExpression { terms }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Term> {
        self.terms.iter()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl From<Variable> for LinearExpression {
    fn from(v: Variable) -> LinearExpression {
        LinearExpression {
            terms: vec![v.into()],
        }
    }
}

impl From<Term> for LinearExpression {
    fn from(t: Term) -> LinearExpression {
        LinearExpression { terms: vec![t] }
    }
}

impl From<Vec<Term>> for LinearExpression {
    fn from(terms: Vec<Term>) -> LinearExpression {
        LinearExpression { terms }
    }
}

impl<L: Into<LinearExpression>> Add<L> for LinearExpression {
    type Output = Self;

    #[inline]
    fn add(mut self, rhs: L) -> Self::Output {
        self.terms.extend_from_slice(&rhs.into().terms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{LinearExpression, Term, Variable, Visibility};
    use crate::coefficients::CoeffId;

    #[test]
    fn test_lc() {
        let var1 = Variable::new(1, Visibility::Secret);
        let var2 = Variable::new(2, Visibility::Internal);
        let lc: LinearExpression = var1 + var2;
        assert_eq!(
            lc.terms,
            vec![Term::new(var1, CoeffId::ONE), Term::new(var2, CoeffId::ONE)]
        );

        let neg = Term::new(var1, CoeffId::MINUS_ONE);
        let lc2 = lc.clone() + neg + Term::constant(CoeffId::TWO);
        assert_eq!(lc2.len(), 4);
        assert_eq!(lc2.terms[..2], lc.terms[..]);
        assert!(lc2.terms[3].is_constant());
        assert!(!lc2.terms[2].is_constant());
    }

    #[test]
    fn test_visibility_tags() {
        for v in [
            Visibility::Unset,
            Visibility::Internal,
            Visibility::Secret,
            Visibility::Public,
            Visibility::Virtual,
        ] {
            assert_eq!(Visibility::from_u8(v.to_u8()), Some(v));
        }
        assert_eq!(Visibility::from_u8(5), None);
    }
}
