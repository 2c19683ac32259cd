//! # Semi-Polynomial Form Module
//!
//! Public surface of the decomposition. An expression, together with an ordered
//! set of designated variables and a degree bound, is split into
//!
//! - a dictionary from bounded-degree monomials to coefficient expressions, and
//! - a residual expression collecting everything that is not a coefficient
//!   times such a monomial,
//!
//! so that `sum(coeff * monomial) + residual` is algebraically equal to the
//! input. On top of that primitive sit three derived views: plain polynomial
//! coefficient extraction (unbounded degree), a sparse linear-system view
//! `A * vars + residual == exprs`, and a sparse quadratic-system view
//! `A1 * vars + A2 * v2 + residual == exprs`.
//!
//! # Examples
//! ```rust, ignore
//! use semipoly::symbolic::symbolic_engine::Expr;
//! let vars = Expr::Symbols("x, y");
//! let (x, y) = (vars[0].clone(), vars[1].clone());
//! let e = Expr::Const(3.0) * x.clone() * x.clone() + y.clone() + Expr::sin(x.boxed());
//! let (dict, residual) = e.semipolynomial_form(&vars, 2.0, true);
//! // dict: {x^2: 3, y: 1}, residual: sin(x)
//! ```

use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_marker::{
    MarkedExpr, MarkerConfig, VarSet, mark_vars,
};
use crate::symbolic::symbolic_normalize::{flatten_terms, normalize};
use log::warn;
use num_traits::Zero;
use sprs::{CsMat, TriMat};
use std::collections::BTreeMap;

/// Canonical dictionary key: the variable part of a polynomial term.
///
/// Maps each designated variable to its (non-negative integer) exponent. The
/// empty map stands for the literal constant `1`, the key under which constant
/// terms are collected. `BTreeMap` keeps the representation canonical, so
/// `x*y` and `y*x` produce identical keys, and gives the dictionary a
/// deterministic iteration order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonomialKey(pub BTreeMap<String, u32>);

impl MonomialKey {
    /// The constant-term key `1`.
    pub fn constant() -> Self {
        MonomialKey(BTreeMap::new())
    }

    /// Key for a single variable to a power.
    pub fn variable(name: &str, exp: u32) -> Self {
        let mut map = BTreeMap::new();
        map.insert(name.to_string(), exp);
        MonomialKey(map)
    }

    pub fn is_constant(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total_degree(&self) -> u32 {
        self.0.values().sum()
    }

    /// Rebuilds the literal monomial expression, `1` for the constant key.
    pub fn to_expr(&self) -> Expr {
        let mut result: Option<Expr> = None;
        for (var, exp) in &self.0 {
            let var_expr = Expr::Var(var.clone());
            let factor = if *exp == 1 {
                var_expr
            } else {
                var_expr.pow(Expr::Const(*exp as f64))
            };
            result = Some(match result {
                Some(acc) => acc * factor,
                None => factor,
            });
        }
        result.unwrap_or(Expr::Const(1.0))
    }

    /// Converts a real-valued exponent map whose entries are known to be
    /// non-negative integers.
    fn from_powers(powers: &BTreeMap<String, f64>) -> Self {
        MonomialKey(
            powers
                .iter()
                .map(|(var, exp)| (var.clone(), *exp as u32))
                .collect(),
        )
    }
}

/// Monomial dictionary: canonical monomial -> coefficient expression.
pub type MonomialDict = BTreeMap<MonomialKey, Expr>;

/// Tests whether one flattened term is a valid bounded-degree monomial times a
/// variable-free coefficient.
///
/// A term qualifies when it is a tagged value whose exponents are all
/// non-negative integers summing to at most `degree_bound`, and whose
/// coefficient does not contain any designated variable (the coefficient can
/// hide variables inherited from an opaque subexpression, so it gets a full
/// recursive scan). A constant monomial (empty exponent map) qualifies only
/// when constants are requested.
pub fn is_bounded_monomial(
    term: &MarkedExpr,
    vars: &VarSet,
    degree_bound: f64,
    include_consts: bool,
) -> bool {
    let sm = match term.as_term() {
        Some(sm) => sm,
        None => return false,
    };
    if sm.degree_map().is_empty() {
        return include_consts && !sm.coeff.contains_any_variable(vars.names());
    }
    sm.degree_map()
        .values()
        .all(|exp| *exp >= 0.0 && exp.fract() == 0.0)
        && sm.total_degree() <= degree_bound
        && !sm.coeff.contains_any_variable(vars.names())
}

/// Rebuilds the plain expression behind a marked node.
///
/// Tagged values reconstruct as `coeff * positive factors / negative factors`;
/// structural nodes rebuild the matching operator over their unwrapped
/// arguments; true leaves come back untouched.
pub fn unwrap_marked(term: &MarkedExpr) -> Expr {
    match term {
        MarkedExpr::Term(sm) => sm.to_expr(),
        MarkedExpr::Sum(items) => items
            .iter()
            .map(unwrap_marked)
            .reduce(|acc, item| acc + item)
            .unwrap_or(Expr::zero()),
        MarkedExpr::Prod(items) => items
            .iter()
            .map(unwrap_marked)
            .reduce(|acc, item| acc * item)
            .unwrap_or(Expr::Const(1.0)),
        MarkedExpr::Div(num, den) => unwrap_marked(num) / unwrap_marked(den),
        MarkedExpr::Pow(base, exp) => unwrap_marked(base).pow(unwrap_marked(exp)),
        MarkedExpr::Func(head, arg) => Expr::apply_unary(*head, unwrap_marked(arg)),
    }
}

/// Splits a flat term list into the monomial dictionary and the residual.
///
/// Qualifying terms accumulate into the dictionary with `+=` on key collision;
/// everything else is unwrapped and summed into the residual, which is exactly
/// `0` when every term qualified.
pub fn bifurcate(
    terms: &[MarkedExpr],
    vars: &VarSet,
    degree_bound: f64,
    include_consts: bool,
) -> (MonomialDict, Expr) {
    let mut dict = MonomialDict::new();
    let mut rejected: Vec<Expr> = Vec::new();
    for term in terms {
        match term.as_term() {
            Some(sm) if is_bounded_monomial(term, vars, degree_bound, include_consts) => {
                let key = MonomialKey::from_powers(sm.degree_map());
                dict.entry(key)
                    .and_modify(|acc| {
                        *acc += sm.coeff.clone();
                        *acc = acc.simplify_();
                    })
                    .or_insert_with(|| sm.coeff.clone());
            }
            _ => rejected.push(unwrap_marked(term)),
        }
    }
    let residual = rejected
        .into_iter()
        .reduce(|acc, term| acc + term)
        .unwrap_or(Expr::zero());
    (dict, residual)
}

/// Shared pipeline: mark, normalize, flatten, bifurcate.
fn decompose(expr: &Expr, vars: &VarSet, degree: f64, consts: bool) -> (MonomialDict, Expr) {
    let marked = mark_vars(expr, vars, &MarkerConfig::default());
    let normalized = normalize(marked);
    let terms = flatten_terms(&normalized);
    bifurcate(&terms, vars, degree, consts)
}

impl Expr {
    /// Decomposes the expression into a bounded-degree monomial dictionary and
    /// a residual, such that `sum(coeff * monomial) + residual` equals the
    /// expression.
    ///
    /// A negative `degree` is rejected with a logged warning: the result is an
    /// empty dictionary and the expression itself as residual. Duplicate
    /// entries in `vars` are a fatal precondition violation.
    ///
    /// # Arguments
    /// * `vars` - designated variables, each must be a `Var`, order is the
    ///   caller's column order
    /// * `degree` - inclusive total-degree bound, `f64::INFINITY` for unbounded
    /// * `consts` - whether variable-free terms are collected under the
    ///   constant key `1` (otherwise they join the residual)
    pub fn semipolynomial_form(
        &self,
        vars: &[Expr],
        degree: f64,
        consts: bool,
    ) -> (MonomialDict, Expr) {
        if degree < 0.0 {
            warn!(
                "degree for semi-polynomial form should not be negative, got {}; returning the expression unchanged",
                degree
            );
            return (MonomialDict::new(), self.clone());
        }
        let var_set = VarSet::new(vars);
        decompose(self, &var_set, degree, consts)
    }

    /// Polynomial coefficient extraction: semi-polynomial form with no degree
    /// bound, constants included.
    pub fn polynomial_coeffs(&self, vars: &[Expr]) -> (MonomialDict, Expr) {
        self.semipolynomial_form(vars, f64::INFINITY, true)
    }
}

/// Vectorized [`Expr::semipolynomial_form`]: one dictionary/residual pair per
/// input expression, order preserved, variable set validated once.
pub fn semipolynomial_forms(
    exprs: &[Expr],
    vars: &[Expr],
    degree: f64,
    consts: bool,
) -> (Vec<MonomialDict>, Vec<Expr>) {
    if degree < 0.0 {
        warn!(
            "degree for semi-polynomial form should not be negative, got {}; returning the expressions unchanged",
            degree
        );
        return (vec![MonomialDict::new(); exprs.len()], exprs.to_vec());
    }
    let var_set = VarSet::new(vars);
    exprs
        .iter()
        .map(|expr| decompose(expr, &var_set, degree, consts))
        .unzip()
}

/// Sparse linear-system view of a sequence of expressions.
///
/// Runs the decomposition at degree 1 with constants excluded, so every
/// surviving dictionary key is exactly one designated variable, then places
/// each coefficient at `(row, column-of-variable)`. The result satisfies
/// `A * vars + residual == exprs` elementwise.
pub fn semilinear_form(exprs: &[Expr], vars: &[Expr]) -> (CsMat<Expr>, Vec<Expr>) {
    let var_set = VarSet::new(vars);
    let (dicts, residuals) = semipolynomial_forms(exprs, vars, 1.0, false);
    let mut triplets = TriMat::new((exprs.len(), var_set.len()));
    for (row, dict) in dicts.iter().enumerate() {
        for (key, coeff) in dict {
            triplets.add_triplet(row, linear_column(key, &var_set), coeff.clone());
        }
    }
    (triplets.to_csr(), residuals)
}

/// Sparse quadratic-system view of a sequence of expressions.
///
/// Runs the decomposition at degree 2 with constants excluded. Degree-1 keys
/// populate `A1` exactly as in [`semilinear_form`]; degree-2 keys populate
/// `A2`, whose columns enumerate the unordered variable pairs `(p, q)` with
/// `p <= q` in the triangular layout of [`pair_to_column`]. The companion
/// dense vector `v2` holds the literal degree-2 monomial at every populated
/// column and zero elsewhere. The result satisfies
/// `A1 * vars + A2 * v2 + residual == exprs` elementwise.
///
/// A dictionary key of any other shape cannot come out of a correct
/// decomposition at degree bound 2 and aborts.
pub fn semiquadratic_form(
    exprs: &[Expr],
    vars: &[Expr],
) -> (CsMat<Expr>, CsMat<Expr>, Vec<Expr>, Vec<Expr>) {
    let var_set = VarSet::new(vars);
    let n = var_set.len();
    let quad_cols = n * (n + 1) / 2;
    let (dicts, residuals) = semipolynomial_forms(exprs, vars, 2.0, false);
    let mut a1 = TriMat::new((exprs.len(), n));
    let mut a2 = TriMat::new((exprs.len(), quad_cols));
    let mut v2 = vec![Expr::zero(); quad_cols];
    for (row, dict) in dicts.iter().enumerate() {
        for (key, coeff) in dict {
            match key.total_degree() {
                1 => a1.add_triplet(row, linear_column(key, &var_set), coeff.clone()),
                2 => {
                    let (p, q) = quadratic_pair(key, &var_set);
                    let col = pair_to_column(p, q);
                    a2.add_triplet(row, col, coeff.clone());
                    v2[col] = key.to_expr();
                }
                other => panic!(
                    "quadratic form produced a monomial of total degree {}: {}",
                    other,
                    key.to_expr()
                ),
            }
        }
    }
    (a1.to_csr(), a2.to_csr(), v2, residuals)
}

/// Column of a degree-1 key, which must be a single bare variable.
fn linear_column(key: &MonomialKey, vars: &VarSet) -> usize {
    if key.0.len() == 1 {
        let (name, exp) = key.0.iter().next().unwrap();
        if *exp == 1 {
            if let Some(col) = vars.position(name) {
                return col;
            }
        }
    }
    panic!("expected a single degree-1 variable key, got {}", key.to_expr());
}

/// Classifies a degree-2 key as a pure square `(q, q)` or a cross term
/// `(p, q)` with `p < q`, in variable-set column indices.
fn quadratic_pair(key: &MonomialKey, vars: &VarSet) -> (usize, usize) {
    let var_index = |name: &str| {
        vars.position(name)
            .unwrap_or_else(|| panic!("monomial key over unknown variable: {}", name))
    };
    let entries: Vec<(&String, &u32)> = key.0.iter().collect();
    if entries.len() == 1 && *entries[0].1 == 2 {
        let q = var_index(entries[0].0);
        (q, q)
    } else if entries.len() == 2 && *entries[0].1 == 1 && *entries[1].1 == 1 {
        let p = var_index(entries[0].0);
        let q = var_index(entries[1].0);
        (p.min(q), p.max(q))
    } else {
        panic!("malformed degree-2 monomial key: {}", key.to_expr());
    }
}

/// Packs the unordered index pair `(p, q)`, `p <= q`, into a single column of
/// the `n(n+1)/2`-wide triangular layout: `q*(q+1)/2 + p`. Pure squares are
/// the degenerate pairs `p == q`.
pub fn pair_to_column(p: usize, q: usize) -> usize {
    q * (q + 1) / 2 + p
}

/// Inverse of [`pair_to_column`].
pub fn column_to_pair(col: usize) -> (usize, usize) {
    let mut q = 0usize;
    while (q + 1) * (q + 2) / 2 <= col {
        q += 1;
    }
    (col - q * (q + 1) / 2, q)
}
