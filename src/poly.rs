//! Normalized multivariate integer polynomials.
//!
//! A polynomial maps monomial keys to non-zero coefficients. The key is a
//! canonical product of SSA definitions with exponents; the empty product is
//! the distinguished constant term. All arithmetic wraps around in two's
//! complement, matching the folder's integer semantics.
//!
//! Division, modulus, and comparisons are not polynomial operations;
//! expressions containing them stay as binary-op nodes unless both operands
//! fold to constants.

use std::collections::BTreeMap;

use crate::ast::DefId;
use crate::error::CompileError;

/// A product of SSA-variable powers. The empty product is the constant key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Monomial {
    powers: BTreeMap<DefId, u32>,
}

impl Monomial {
    /// The constant key (empty product).
    #[must_use]
    pub fn constant() -> Self {
        Self::default()
    }

    /// The monomial `def^1`.
    #[must_use]
    pub fn var(def: DefId) -> Self {
        let mut powers = BTreeMap::new();
        powers.insert(def, 1);
        Self { powers }
    }

    /// Whether this is the constant key.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.powers.is_empty()
    }

    /// Multiply two monomials by adding exponents.
    #[must_use]
    pub fn mul(&self, other: &Monomial) -> Monomial {
        let mut powers = self.powers.clone();
        for (&def, &exp) in &other.powers {
            *powers.entry(def).or_insert(0) += exp;
        }
        Monomial { powers }
    }

    /// The definitions and exponents making up this key.
    pub fn powers(&self) -> impl Iterator<Item = (DefId, u32)> + '_ {
        self.powers.iter().map(|(&d, &e)| (d, e))
    }

    fn from_powers(powers: std::collections::BTreeMap<DefId, u32>) -> Self {
        let powers = powers.into_iter().filter(|&(_, e)| e > 0).collect();
        Self { powers }
    }
}

/// A polynomial in canonical form: no zero coefficients are stored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Polynomial {
    terms: BTreeMap<Monomial, i64>,
}

impl Polynomial {
    /// The zero polynomial.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// A constant polynomial.
    #[must_use]
    pub fn constant(value: i64) -> Self {
        let mut p = Self::zero();
        p.add_term(Monomial::constant(), value);
        p
    }

    /// The polynomial `1 * def`.
    #[must_use]
    pub fn var(def: DefId) -> Self {
        let mut p = Self::zero();
        p.add_term(Monomial::var(def), 1);
        p
    }

    fn add_term(&mut self, key: Monomial, coeff: i64) {
        if coeff == 0 {
            return;
        }
        let entry = self.terms.entry(key.clone()).or_insert(0);
        *entry = entry.wrapping_add(coeff);
        if *entry == 0 {
            self.terms.remove(&key);
        }
    }

    /// Sum of two polynomials.
    #[must_use]
    pub fn add(&self, other: &Polynomial) -> Polynomial {
        let mut result = self.clone();
        for (key, &coeff) in &other.terms {
            result.add_term(key.clone(), coeff);
        }
        result
    }

    /// Difference of two polynomials.
    #[must_use]
    pub fn sub(&self, other: &Polynomial) -> Polynomial {
        self.add(&other.neg())
    }

    /// Negation.
    #[must_use]
    pub fn neg(&self) -> Polynomial {
        let mut result = Polynomial::zero();
        for (key, &coeff) in &self.terms {
            result.add_term(key.clone(), coeff.wrapping_neg());
        }
        result
    }

    /// Product of two polynomials (Cartesian product of monomials).
    #[must_use]
    pub fn mul(&self, other: &Polynomial) -> Polynomial {
        let mut result = Polynomial::zero();
        for (k1, &c1) in &self.terms {
            for (k2, &c2) in &other.terms {
                result.add_term(k1.mul(k2), c1.wrapping_mul(c2));
            }
        }
        result
    }

    /// Whether the only key present is the constant key (or no key at all).
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.terms.keys().all(Monomial::is_constant)
    }

    /// The constant value of a constant-only polynomial.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::NonConstantPolynomial`] if any non-constant
    /// key is present; callers must not request the value of a non-constant
    /// polynomial.
    pub fn constant_value(&self) -> Result<i64, CompileError> {
        if !self.is_constant() {
            return Err(CompileError::NonConstantPolynomial);
        }
        Ok(self
            .terms
            .get(&Monomial::constant())
            .copied()
            .unwrap_or(0))
    }

    /// Number of terms.
    #[must_use]
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// The terms in canonical key order.
    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, i64)> {
        self.terms.iter().map(|(k, &c)| (k, c))
    }

    /// One entry per (monomial, definition) pair, used for ref counting:
    /// each monomial naming a definition counts as one read of it.
    #[must_use]
    pub fn def_occurrences(&self) -> Vec<DefId> {
        let mut out = Vec::new();
        for key in self.terms.keys() {
            for (def, _) in key.powers() {
                out.push(def);
            }
        }
        out
    }

    /// Whether any stored coefficient is zero (always false for values built
    /// through this module's operations; checked by the IR validator).
    #[must_use]
    pub fn has_zero_coefficient(&self) -> bool {
        self.terms.values().any(|&c| c == 0)
    }

    /// Whether any monomial names the given definition.
    #[must_use]
    pub fn mentions(&self, def: DefId) -> bool {
        self.terms
            .keys()
            .any(|key| key.powers().any(|(d, _)| d == def))
    }

    /// Replace a definition with its known constant value, merging and
    /// re-canonicalizing the affected terms.
    #[must_use]
    pub fn substitute_const(&self, def: DefId, value: i64) -> Polynomial {
        let mut result = Polynomial::zero();
        for (key, coeff) in self.terms() {
            let mut powers: std::collections::BTreeMap<DefId, u32> = key.powers().collect();
            match powers.remove(&def) {
                Some(exp) => {
                    let scaled = coeff.wrapping_mul(pow_wrapping(value, exp));
                    result.add_term(Monomial::from_powers(powers), scaled);
                }
                None => result.add_term(key.clone(), coeff),
            }
        }
        result
    }

    /// Rewrite every occurrence of one definition to another (used by copy
    /// propagation).
    #[must_use]
    pub fn rename_def(&self, from: DefId, to: DefId) -> Polynomial {
        let mut result = Polynomial::zero();
        for (key, coeff) in self.terms() {
            let mut powers: std::collections::BTreeMap<DefId, u32> = key.powers().collect();
            match powers.remove(&from) {
                Some(exp) => {
                    *powers.entry(to).or_insert(0) += exp;
                    result.add_term(Monomial::from_powers(powers), coeff);
                }
                None => result.add_term(key.clone(), coeff),
            }
        }
        result
    }

    /// If the polynomial is exactly `1 * def`, that definition.
    #[must_use]
    pub fn as_single_var(&self) -> Option<DefId> {
        if self.terms.len() != 1 {
            return None;
        }
        let (key, &coeff) = self.terms.iter().next()?;
        if coeff != 1 {
            return None;
        }
        let mut powers = key.powers();
        match (powers.next(), powers.next()) {
            (Some((def, 1)), None) => Some(def),
            _ => None,
        }
    }
}

fn pow_wrapping(base: i64, exp: u32) -> i64 {
    let mut result: i64 = 1;
    for _ in 0..exp {
        result = result.wrapping_mul(base);
    }
    result
}
