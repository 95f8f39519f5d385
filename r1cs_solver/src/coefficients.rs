use std::collections::HashMap;

use ark_ff::PrimeField;
use num_bigint::BigUint;

/// Reference to a constant of the [`CoeffTable`].
///
/// The first four IDs are reserved for `0`, `1`, `2` and `-1`. Operations on
/// them never touch the table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoeffId(pub u32);

impl CoeffId {
    pub const ZERO: CoeffId = CoeffId(0);
    pub const ONE: CoeffId = CoeffId(1);
    pub const TWO: CoeffId = CoeffId(2);
    pub const MINUS_ONE: CoeffId = CoeffId(3);

    /// Number of reserved IDs at the start of the table.
    pub const NUM_RESERVED: usize = 4;

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Immutable table of the distinct constants used by a constraint system.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoeffTable<F: PrimeField> {
    values: Vec<F>,
}

impl<F: PrimeField> CoeffTable<F> {
    pub fn new(values: Vec<F>) -> Self {
        CoeffTable { values }
    }

    /// Builds the table from the big integers handed over by the compiler,
    /// reducing each one into the field.
    pub fn from_biguints(values: &[BigUint]) -> Self {
        let values = values.iter().map(|v| F::from(v.clone())).collect();
        CoeffTable { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[F] {
        &self.values
    }

    /// Value of the coefficient `id`.
    pub fn get(&self, id: CoeffId) -> F {
        match id {
            CoeffId::ZERO => F::zero(),
            CoeffId::ONE => F::one(),
            CoeffId::TWO => F::one().double(),
            CoeffId::MINUS_ONE => -F::one(),
            _ => self.values[id.index()],
        }
    }

    /// Sets `value = value * coeff`.
    #[inline]
    pub fn apply(&self, value: &mut F, id: CoeffId) {
        match id {
            CoeffId::ONE => {}
            CoeffId::MINUS_ONE => *value = -*value,
            CoeffId::ZERO => *value = F::zero(),
            CoeffId::TWO => {
                value.double_in_place();
            }
            _ => *value *= &self.values[id.index()],
        }
    }

    /// Returns `coeff * value`.
    #[inline]
    pub fn term_value(&self, id: CoeffId, value: &F) -> F {
        let mut res = *value;
        self.apply(&mut res, id);
        res
    }

    /// Sets `value = value / coeff`. A zero coefficient leaves `value` at zero.
    pub fn divide(&self, value: &mut F, id: CoeffId) {
        match id {
            CoeffId::ONE => {}
            CoeffId::MINUS_ONE => *value = -*value,
            CoeffId::ZERO => *value = F::zero(),
            _ => match self.get(id).inverse() {
                Some(inv) => *value *= inv,
                None => *value = F::zero(),
            },
        }
    }
}

/// De-duplicates constants while a constraint system is being assembled.
#[derive(Clone, Debug)]
pub struct CoeffTableBuilder<F: PrimeField> {
    values: Vec<F>,
    ids: HashMap<F, CoeffId>,
}

impl<F: PrimeField> CoeffTableBuilder<F> {
    pub fn new() -> Self {
        let mut builder = CoeffTableBuilder {
            values: Vec::new(),
            ids: HashMap::new(),
        };
        // reserved IDs, in order
        for v in [F::zero(), F::one(), F::one().double(), -F::one()] {
            builder.get_or_insert(v);
        }
        builder
    }

    pub fn get_or_insert(&mut self, value: F) -> CoeffId {
        if let Some(id) = self.ids.get(&value) {
            return *id;
        }
        let id = CoeffId(self.values.len() as u32);
        self.values.push(value);
        self.ids.insert(value, id);
        id
    }

    pub fn build(self) -> CoeffTable<F> {
        CoeffTable::new(self.values)
    }
}

impl<F: PrimeField> Default for CoeffTableBuilder<F> {
    fn default() -> Self {
        Self::new()
    }
}
