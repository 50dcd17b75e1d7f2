//! Rewrites a dependency into a canonical, cheaper equivalent using the rules
//! of boolean algebra. Operand order is never changed, so short-circuit
//! evaluation order survives simplification.

use std::sync::Arc;

use super::Dependency;

const COMPOSITE_WEIGHT: f64 = 1.2;

/// Rough measure of how hard an expression is to read and evaluate.
/// Leaves cost 1; each `Not`/`And`/`Or` multiplies the cost of its operands by 1.2.
pub fn cost(dep: &Dependency) -> f64 {
    match dep {
        Dependency::And(deps) | Dependency::Or(deps) => {
            COMPOSITE_WEIGHT * deps.iter().map(cost).sum::<f64>()
        }
        Dependency::Not(dep) => COMPOSITE_WEIGHT * cost(dep),
        _ => 1.0,
    }
}

/// Simplify `dep` bottom-up. The result is idempotent:
/// `simplify(&simplify(x)) == simplify(x)`.
pub fn simplify(dep: &Dependency) -> Dependency {
    de_morgan(simplify_no_de_morgan(dep))
}

/// Every rule except De Morgan's, which needs the rest to pick its cheaper form.
fn simplify_no_de_morgan(dep: &Dependency) -> Dependency {
    match dep {
        Dependency::And(deps) => simplify_sequence(deps, Op::And),
        Dependency::Or(deps) => simplify_sequence(deps, Op::Or),
        Dependency::Not(inner) => match &**inner {
            // !!x = x, before x's own negations get rewritten by De Morgan:
            Dependency::Not(x) => simplify(x),
            _ => match simplify(inner) {
                Dependency::Not(x) => (*x).clone(),
                Dependency::True => Dependency::False,
                Dependency::False => Dependency::True,
                other => Dependency::Not(Arc::new(other)),
            },
        },
        leaf => leaf.clone(),
    }
}

/// Choose between `!(a & b)` and `!a | !b` (or the `Or` dual), keeping the
/// original form unless the expansion is strictly cheaper.
fn de_morgan(dep: Dependency) -> Dependency {
    let alternative = match &dep {
        Dependency::Not(inner) => match &**inner {
            Dependency::And(deps) => simplify_no_de_morgan(&Dependency::Or(negate_all(deps))),
            Dependency::Or(deps) => simplify_no_de_morgan(&Dependency::And(negate_all(deps))),
            _ => return dep,
        },
        _ => return dep,
    };
    if cost(&alternative) < cost(&dep) {
        alternative
    } else {
        dep
    }
}

fn negate_all(deps: &[Dependency]) -> Arc<[Dependency]> {
    deps.iter().map(|dep| !dep.clone()).collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Op {
    And,
    Or,
}

impl Op {
    /// Element that leaves the operation unchanged (x & true = x).
    fn identity(self) -> Dependency {
        match self {
            Op::And => Dependency::True,
            Op::Or => Dependency::False,
        }
    }

    /// Element that decides the whole operation (x & false = false).
    fn absorbing(self) -> Dependency {
        match self {
            Op::And => Dependency::False,
            Op::Or => Dependency::True,
        }
    }

    fn build(self, deps: Vec<Dependency>) -> Dependency {
        match self {
            Op::And => Dependency::And(deps.into()),
            Op::Or => Dependency::Or(deps.into()),
        }
    }

    /// Operands of `dep` if it is the same operation as `self`.
    fn operands_of(self, dep: &Dependency) -> Option<&[Dependency]> {
        match (self, dep) {
            (Op::And, Dependency::And(deps)) | (Op::Or, Dependency::Or(deps)) => Some(deps),
            _ => None,
        }
    }
}

fn simplify_sequence(deps: &[Dependency], op: Op) -> Dependency {
    // x & !x = false; x | !x is left as is.
    // Checked before and after operands are simplified and spliced, since
    // either step can hide one half of the pair.
    let check_contradiction = |deps: &[Dependency]| op == Op::And && has_contradiction(deps);

    if check_contradiction(deps) {
        return Dependency::False;
    }
    let simplified: Vec<Dependency> = deps.iter().map(simplify).collect();
    if check_contradiction(&simplified) {
        return Dependency::False;
    }

    // splice nested operations of the same kind into this one.
    // a simplified operand never directly contains its own kind, so one level is enough.
    let mut flat = Vec::with_capacity(simplified.len());
    for dep in simplified {
        match op.operands_of(&dep) {
            Some(inner) => flat.extend(inner.iter().cloned()),
            None => flat.push(dep),
        }
    }

    let identity = op.identity();
    let absorbing = op.absorbing();
    let mut kept: Vec<Dependency> = Vec::with_capacity(flat.len());
    for dep in flat {
        if dep == absorbing {
            return absorbing;
        }
        if dep != identity && !kept.contains(&dep) {
            kept.push(dep);
        }
    }
    if check_contradiction(&kept) {
        return Dependency::False;
    }

    match kept.len() {
        0 => identity,
        1 => kept.pop().unwrap_or(identity),
        _ => op.build(kept),
    }
}

/// True if some operand is `!x` and `x` is also an operand.
fn has_contradiction(deps: &[Dependency]) -> bool {
    deps.iter().any(|dep| match dep {
        Dependency::Not(inner) => deps.iter().any(|other| other == &**inner),
        _ => false,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{CycleOffset, Path};
    use proptest::prelude::*;

    fn exists(hours: i64) -> Dependency {
        Dependency::cycle_exists(CycleOffset::hours(hours))
    }

    fn done(path: &str) -> Dependency {
        Dependency::completed(Path::dotted(path)).unwrap()
    }

    #[test]
    fn test_cost() {
        let (d1, d2) = (exists(0), exists(1));
        assert!((cost(&(d1.clone() | d2.clone())) - 2.4).abs() < 1e-3);
        assert!((cost(&(d1.clone() & d2.clone())) - 2.4).abs() < 1e-3);
        assert!((cost(&!(d1 & d2)) - 2.88).abs() < 1e-3);
    }

    #[test]
    fn test_identity_and_absorption() {
        let x = done("a") | done("b");
        assert_eq!(simplify(&(x.clone() & Dependency::True)), simplify(&x));
        assert_eq!(simplify(&(x.clone() | Dependency::False)), simplify(&x));
        assert_eq!(simplify(&(x.clone() & Dependency::False)), Dependency::False);
        assert_eq!(simplify(&(x | Dependency::True)), Dependency::True);
        assert_eq!(simplify(&(Dependency::True & Dependency::True)), Dependency::True);
        assert_eq!(simplify(&(Dependency::False | Dependency::False)), Dependency::False);
    }

    #[test]
    fn test_flatten_and_dedupe() {
        let dep = done("a") & (done("b") & (done("a") & done("c")));
        let expected = Dependency::and(vec![done("a"), done("b"), done("c")]).unwrap();
        assert_eq!(simplify(&dep), expected);

        let dep = (done("a") | done("b")) | (done("b") | done("a"));
        assert_eq!(simplify(&dep), done("a") | done("b"));
    }

    #[test]
    fn test_mixed_nesting_is_kept() {
        let dep = done("a") | (done("b") & done("c"));
        assert_eq!(simplify(&dep), dep);
    }

    #[test]
    fn test_negation() {
        let x = done("a");
        assert_eq!(simplify(&!!x.clone()), x);
        assert_eq!(simplify(&!Dependency::True), Dependency::False);
        assert_eq!(simplify(&!Dependency::False), Dependency::True);
        assert_eq!(simplify(&!(x.clone() & Dependency::True)), !x);
    }

    #[test]
    fn test_contradiction() {
        let (d1, d2) = (exists(0), exists(1));
        assert_eq!(simplify(&(!d1.clone() & d1.clone())), Dependency::False);
        assert_eq!(simplify(&(!d2.clone() & !(!d1 | !d2))), Dependency::False);
        let x = done("a") | done("b");
        assert_eq!(simplify(&(x.clone() & done("c") & !x)), Dependency::False);
    }

    #[test]
    fn test_no_tautology_rule_for_or() {
        let d1 = exists(0);
        let dep = !d1.clone() | d1.clone();
        assert_eq!(simplify(&dep), dep);
    }

    #[test]
    fn test_de_morgan() {
        let (d1, d2) = (exists(0), exists(1));
        // !(!a | !b) is cheaper as a & b:
        assert_eq!(simplify(&!(!d1.clone() | !d2.clone())), d1.clone() & d2.clone());
        // a tie keeps the original form:
        assert_eq!(simplify(&!(d1.clone() & d2.clone())), !(d1.clone() & d2.clone()));
        // both spellings meet when the expansion is cheaper:
        let (a, b) = (!d1, d2);
        assert_eq!(
            simplify(&!(a.clone() & b.clone())),
            simplify(&(!a.clone() | !b.clone()))
        );
        assert_eq!(
            simplify(&!(a.clone() | b.clone())),
            simplify(&(!a & !b))
        );
    }

    fn leaf_strategy() -> impl Strategy<Value = Dependency> {
        prop_oneof![
            Just(Dependency::True),
            Just(Dependency::False),
            (0..3i64).prop_map(exists),
            prop::sample::select(vec!["a", "b", "fam.c"]).prop_map(done),
        ]
    }

    fn dep_strategy() -> impl Strategy<Value = Dependency> {
        leaf_strategy().prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                inner.clone().prop_map(|dep| !dep),
                prop::collection::vec(inner.clone(), 1..4)
                    .prop_map(|deps| Dependency::and(deps).unwrap()),
                prop::collection::vec(inner, 1..4).prop_map(|deps| Dependency::or(deps).unwrap()),
            ]
        })
    }

    /// Every assignment of the six distinct leaves the strategies can produce.
    fn assignments() -> Vec<Vec<bool>> {
        (0..64u32)
            .map(|bits| (0..6).map(|i| bits & (1 << i) != 0).collect())
            .collect()
    }

    fn leaf_index(leaf: &Dependency) -> usize {
        match leaf {
            Dependency::CycleExists(dt) => dt.duration().num_hours() as usize,
            Dependency::State { path, .. } => 3 + ["a", "b", "fam.c"]
                .iter()
                .position(|p| Path::dotted(p) == *path)
                .unwrap_or(0),
            _ => 0,
        }
    }

    fn equivalent(x: &Dependency, y: &Dependency) -> bool {
        assignments().iter().all(|values| {
            let mut oracle = |leaf: &Dependency| values[leaf_index(leaf)];
            x.evaluate(&mut oracle) == y.evaluate(&mut oracle)
        })
    }

    proptest! {
        #[test]
        fn test_idempotent(dep in dep_strategy()) {
            let once = simplify(&dep);
            prop_assert_eq!(simplify(&once), once);
        }

        #[test]
        fn test_preserves_meaning(dep in dep_strategy()) {
            prop_assert!(equivalent(&dep, &simplify(&dep)));
        }

        #[test]
        fn test_double_negation(dep in dep_strategy()) {
            prop_assert_eq!(simplify(&!!dep.clone()), simplify(&dep));
        }

        #[test]
        fn test_contradiction_always_false(dep in dep_strategy()) {
            prop_assert_eq!(simplify(&(dep.clone() & !dep)), Dependency::False);
        }

        #[test]
        fn test_de_morgan_equivalent(a in dep_strategy(), b in dep_strategy()) {
            let lhs = simplify(&!(a.clone() & b.clone()));
            let rhs = simplify(&(!a.clone() | !b.clone()));
            prop_assert!(equivalent(&lhs, &rhs));
            let lhs = simplify(&!(a.clone() | b.clone()));
            let rhs = simplify(&(!a & !b));
            prop_assert!(equivalent(&lhs, &rhs));
        }
    }
}
