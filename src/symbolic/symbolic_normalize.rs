//! # Monomial Normalization Module
//!
//! Second pass of the semi-polynomial decomposition: drives a marked tree to a
//! fixed point under a small closed set of structural rewrite rules, so that
//! afterwards every additive term is either a single tagged value or a shape
//! (unreduced power, division, function application) that can never become one.
//!
//! ## Rule Set
//!
//! Applied bottom-up; after any rule fires the scan restarts from the top of
//! the tree, because one rewrite routinely unlocks another:
//!
//! 1. tagged value raised to a real exponent folds via `SemiMonomial::power`
//! 2. a sum raised to a non-negative integer exponent is rewritten to an
//!    n-fold product of the sum (rule 4 then completes the expansion)
//! 3. a product whose factors are all tagged values folds via repeated
//!    `SemiMonomial::multiply`
//! 4. a product containing at least one sum distributes fully into a sum of
//!    products
//! 5. a division of two tagged values folds via `SemiMonomial::divide`
//!
//! No fraction cancellation is attempted beyond what the rules produce
//! structurally (`x / x` collapses through rule 5, `x / (1 + x)` stays put).
//!
//! Termination: rules 1, 3 and 5 each remove a composite node, rule 2 turns a
//! power into a finite product, and rule 4 strictly reduces the number of sums
//! sitting under products. Expansion of finite polynomial powers terminates, so
//! the loop does.

use crate::symbolic::symbolic_marker::{MarkedExpr, SemiMonomial};
use itertools::Itertools;

/// Rewrites the marked tree to its normal form, restarting the rule scan from
/// the top after every successful rewrite.
pub fn normalize(mut tree: MarkedExpr) -> MarkedExpr {
    while let Some(next) = rewrite_once(&tree) {
        tree = next;
    }
    tree
}

/// One bottom-up pass: rewrites the first redex found (children before the
/// node itself) and returns the updated tree, or None at the fixed point.
fn rewrite_once(node: &MarkedExpr) -> Option<MarkedExpr> {
    match node {
        MarkedExpr::Sum(items) => {
            for (i, item) in items.iter().enumerate() {
                if let Some(new_item) = rewrite_once(item) {
                    let mut new_items = items.clone();
                    new_items[i] = new_item;
                    return Some(MarkedExpr::sum(new_items));
                }
            }
        }
        MarkedExpr::Prod(items) => {
            for (i, item) in items.iter().enumerate() {
                if let Some(new_item) = rewrite_once(item) {
                    let mut new_items = items.clone();
                    new_items[i] = new_item;
                    return Some(MarkedExpr::prod(new_items));
                }
            }
        }
        MarkedExpr::Div(num, den) => {
            if let Some(new_num) = rewrite_once(num) {
                return Some(MarkedExpr::Div(Box::new(new_num), den.clone()));
            }
            if let Some(new_den) = rewrite_once(den) {
                return Some(MarkedExpr::Div(num.clone(), Box::new(new_den)));
            }
        }
        MarkedExpr::Pow(base, exp) => {
            if let Some(new_base) = rewrite_once(base) {
                return Some(MarkedExpr::Pow(Box::new(new_base), exp.clone()));
            }
            if let Some(new_exp) = rewrite_once(exp) {
                return Some(MarkedExpr::Pow(base.clone(), Box::new(new_exp)));
            }
        }
        MarkedExpr::Func(head, arg) => {
            if let Some(new_arg) = rewrite_once(arg) {
                return Some(MarkedExpr::Func(*head, Box::new(new_arg)));
            }
        }
        MarkedExpr::Term(_) => {}
    }
    local_rule(node)
}

/// The five rules, tried in order against a single node.
fn local_rule(node: &MarkedExpr) -> Option<MarkedExpr> {
    match node {
        MarkedExpr::Pow(base, exp) => {
            let exponent = exp.as_term().and_then(|t| t.to_real())?;
            match base.as_ref() {
                // rule 1: TaggedValue ^ real
                MarkedExpr::Term(sm) => Some(MarkedExpr::Term(sm.power(exponent))),
                // rule 2: (sum of terms) ^ non-negative integer
                MarkedExpr::Sum(terms) => {
                    if exponent >= 0.0 && exponent.fract() == 0.0 {
                        let n = exponent as usize;
                        match n {
                            0 => Some(MarkedExpr::Term(SemiMonomial::one())),
                            1 => Some(MarkedExpr::Sum(terms.clone())),
                            _ => Some(MarkedExpr::prod(vec![MarkedExpr::Sum(terms.clone()); n])),
                        }
                    } else {
                        None
                    }
                }
                _ => None,
            }
        }
        MarkedExpr::Prod(factors) => {
            // rule 3: product of tagged values folds eagerly
            if factors.iter().all(|f| matches!(f, MarkedExpr::Term(_))) {
                let folded = factors
                    .iter()
                    .filter_map(MarkedExpr::as_term)
                    .fold(SemiMonomial::one(), |acc, t| acc.multiply(t));
                return Some(MarkedExpr::Term(folded));
            }
            // rule 4: distribute over any sum-valued factor
            if factors.iter().any(|f| matches!(f, MarkedExpr::Sum(_))) {
                let choice_lists: Vec<Vec<MarkedExpr>> = factors
                    .iter()
                    .map(|f| match f {
                        MarkedExpr::Sum(terms) => terms.clone(),
                        other => vec![other.clone()],
                    })
                    .collect();
                let expanded: Vec<MarkedExpr> = choice_lists
                    .into_iter()
                    .multi_cartesian_product()
                    .map(MarkedExpr::prod)
                    .collect();
                return Some(MarkedExpr::sum(expanded));
            }
            None
        }
        // rule 5: TaggedValue / TaggedValue
        MarkedExpr::Div(num, den) => match (num.as_ref(), den.as_ref()) {
            (MarkedExpr::Term(a), MarkedExpr::Term(b)) => Some(MarkedExpr::Term(a.divide(b))),
            _ => None,
        },
        _ => None,
    }
}

/// Expands a normalized expression into its flat list of additive terms.
///
/// Nested sums are flattened recursively; anything else is a flattening leaf.
/// A whole expression that reduced to the zero tagged value yields the empty
/// list.
pub fn flatten_terms(expr: &MarkedExpr) -> Vec<MarkedExpr> {
    if let MarkedExpr::Term(sm) = expr {
        if sm.is_zero() {
            return Vec::new();
        }
    }
    let mut out = Vec::new();
    collect_terms(expr, &mut out);
    out
}

fn collect_terms(expr: &MarkedExpr, out: &mut Vec<MarkedExpr>) {
    match expr {
        MarkedExpr::Sum(items) => {
            for item in items {
                collect_terms(item, out);
            }
        }
        other => out.push(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::symbolic_engine::Expr;
    use crate::symbolic::symbolic_marker::{MarkerConfig, VarSet, mark_vars};

    fn normalized(input: &Expr, vars: &VarSet) -> MarkedExpr {
        normalize(mark_vars(input, vars, &MarkerConfig::default()))
    }

    #[test]
    fn test_product_of_terms_folds() {
        let vars = VarSet::new(&Expr::Symbols("x, y"));
        let expr = Expr::Const(2.0) * Expr::Var("x".to_string()) * Expr::Var("y".to_string());
        let result = normalized(&expr, &vars);
        let term = result.as_term().expect("expected a single tagged value");
        assert_eq!(term.powers.get("x"), Some(&1.0));
        assert_eq!(term.powers.get("y"), Some(&1.0));
        assert_eq!(term.coeff, Expr::Const(2.0));
    }

    #[test]
    fn test_power_of_sum_expands() {
        let vars = VarSet::new(&Expr::Symbols("x, y"));
        let sum = Expr::Var("x".to_string()) + Expr::Var("y".to_string());
        let expr = sum.pow(Expr::Const(2.0));
        let result = normalized(&expr, &vars);
        let terms = flatten_terms(&result);
        assert_eq!(terms.len(), 4);
        assert!(terms.iter().all(|t| t.as_term().is_some()));
        let total: f64 = terms
            .iter()
            .map(|t| t.as_term().unwrap().total_degree())
            .sum();
        assert_eq!(total, 8.0);
    }

    #[test]
    fn test_division_of_terms_folds() {
        let vars = VarSet::new(&Expr::Symbols("x"));
        let x = Expr::Var("x".to_string());
        let expr = x.clone() / x;
        let result = normalized(&expr, &vars);
        assert_eq!(result.as_term().unwrap().to_real(), Some(1.0));
    }

    #[test]
    fn test_variable_exponent_is_left_alone() {
        let vars = VarSet::new(&Expr::Symbols("x, y"));
        let expr = Expr::Var("x".to_string()).pow(Expr::Var("y".to_string()));
        let result = normalized(&expr, &vars);
        assert!(matches!(result, MarkedExpr::Pow(_, _)));
    }

    #[test]
    fn test_distribution_over_opaque_factor() {
        let vars = VarSet::new(&Expr::Symbols("x, y"));
        let sum = Expr::Var("x".to_string()) + Expr::Var("y".to_string());
        let expr = Expr::sin(Expr::Var("x".to_string()).boxed()) * sum;
        let result = normalized(&expr, &vars);
        let terms = flatten_terms(&result);
        assert_eq!(terms.len(), 2);
    }

    #[test]
    fn test_zero_expression_flattens_to_nothing() {
        let vars = VarSet::new(&Expr::Symbols("x"));
        let expr = Expr::Const(0.0) * Expr::Var("x".to_string());
        let result = normalized(&expr, &vars);
        assert!(flatten_terms(&result).is_empty());
    }
}
