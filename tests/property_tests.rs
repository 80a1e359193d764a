//! Property-based tests for the polynomial engine and folder semantics.

use basil::ast::{BinOp, DefId, UnaryOp};
use basil::poly::Polynomial;
use proptest::prelude::*;

/// A small random polynomial over at most four variables.
fn polynomial() -> impl Strategy<Value = Polynomial> {
    prop::collection::vec((0u32..4, -50i64..50), 0..6).prop_map(|terms| {
        let mut p = Polynomial::zero();
        for (var, coeff) in terms {
            let term = Polynomial::var(DefId(var)).mul(&Polynomial::constant(coeff));
            p = p.add(&term);
        }
        p
    })
}

proptest! {
    #[test]
    fn addition_commutes(a in polynomial(), b in polynomial()) {
        prop_assert_eq!(a.add(&b), b.add(&a));
    }

    #[test]
    fn multiplication_commutes(a in polynomial(), b in polynomial()) {
        prop_assert_eq!(a.mul(&b), b.mul(&a));
    }

    #[test]
    fn multiplication_distributes_over_addition(
        a in polynomial(),
        b in polynomial(),
        c in polynomial(),
    ) {
        prop_assert_eq!(a.mul(&b.add(&c)), a.mul(&b).add(&a.mul(&c)));
    }

    #[test]
    fn subtracting_self_cancels(a in polynomial()) {
        let zero = a.sub(&a);
        prop_assert_eq!(zero.term_count(), 0);
        prop_assert!(!zero.has_zero_coefficient());
    }

    #[test]
    fn results_stay_canonical(a in polynomial(), b in polynomial()) {
        prop_assert!(!a.add(&b).has_zero_coefficient());
        prop_assert!(!a.sub(&b).has_zero_coefficient());
        prop_assert!(!a.mul(&b).has_zero_coefficient());
        prop_assert!(!a.neg().has_zero_coefficient());
    }

    #[test]
    fn constant_polynomials_round_trip(v in any::<i64>()) {
        let p = Polynomial::constant(v);
        prop_assert!(p.is_constant());
        prop_assert_eq!(p.constant_value().unwrap(), v);
    }

    #[test]
    fn substitution_matches_evaluation(coeff in -100i64..100, value in -100i64..100, k in 1u32..4) {
        // coeff * x^k with x := value
        let x = Polynomial::var(DefId(0));
        let mut p = Polynomial::constant(coeff);
        for _ in 0..k {
            p = p.mul(&x);
        }
        let substituted = p.substitute_const(DefId(0), value);
        prop_assert!(substituted.is_constant());
        let expected = (0..k).fold(coeff, |acc, _| acc.wrapping_mul(value));
        prop_assert_eq!(substituted.constant_value().unwrap(), expected);
    }

    #[test]
    fn binary_eval_matches_i64_semantics(a in any::<i64>(), b in any::<i64>()) {
        prop_assert_eq!(BinOp::Add.eval(a, b), Some(a.wrapping_add(b)));
        prop_assert_eq!(BinOp::Sub.eval(a, b), Some(a.wrapping_sub(b)));
        prop_assert_eq!(BinOp::Mul.eval(a, b), Some(a.wrapping_mul(b)));
        if b == 0 {
            prop_assert_eq!(BinOp::Div.eval(a, b), None);
            prop_assert_eq!(BinOp::Mod.eval(a, b), None);
        } else {
            prop_assert_eq!(BinOp::Div.eval(a, b), Some(a.wrapping_div(b)));
            prop_assert_eq!(BinOp::Mod.eval(a, b), Some(a.wrapping_rem(b)));
        }
        prop_assert_eq!(BinOp::Lt.eval(a, b), Some(i64::from(a < b)));
        prop_assert_eq!(BinOp::Eq.eval(a, b), Some(i64::from(a == b)));
    }

    #[test]
    fn unary_eval_matches_i64_semantics(v in any::<i64>()) {
        prop_assert_eq!(UnaryOp::Plus.eval(v), v);
        prop_assert_eq!(UnaryOp::Neg.eval(v), v.wrapping_neg());
    }
}

#[test]
fn division_semantics_match_the_target() {
    // truncation toward zero, remainder takes the dividend's sign
    assert_eq!(BinOp::Div.eval(-7, 2), Some(-3));
    assert_eq!(BinOp::Mod.eval(-7, 2), Some(-1));
    assert_eq!(BinOp::Div.eval(7, -2), Some(-3));
    assert_eq!(BinOp::Mod.eval(7, -2), Some(1));
}
