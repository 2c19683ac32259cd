//! # Variable Marking Module
//!
//! First pass of the semi-polynomial decomposition. Every leaf of an expression
//! tree is classified against a set of designated variables and replaced by a
//! tagged value: a pair of a monomial part (carried as an exponent map over the
//! designated variables) and a coefficient part (an arbitrary expression that is
//! supposed to be free of the designated variables once normalization is done).
//!
//! The marked tree is a dedicated working representation, [`MarkedExpr`], covering
//! the operator classes the decomposition distinguishes: additive, multiplicative,
//! division, power, whitelisted unary function, and the tagged values themselves
//! (which double as the opaque-coefficient fallback). `sqrt` never appears in the
//! marked tree; the marker rewrites it to a power of one half before
//! classification.
//!
//! Which unary function heads are propagated through (instead of being frozen as
//! opaque coefficients) is controlled by an explicit [`MarkerConfig`] table passed
//! into [`mark_vars`], so marking is fully determined by its inputs.

use crate::symbolic::symbolic_engine::{Expr, UnaryFunc};
use std::collections::{BTreeMap, HashMap};

/// One additive term in tagged form: `coeff * Π v^powers[v]`.
///
/// The monomial part is stored directly as its exponent map over the designated
/// variables. Exponents are real: division produces negative entries and the
/// sqrt rewrite produces fractional ones. Whether an exponent combination is
/// acceptable for the final polynomial dictionary is decided later, by the
/// bounded-monomial test, not here.
///
/// The arithmetic below is closed: combining two tagged values always folds the
/// exponent maps together and the coefficient expressions together. Addition is
/// deliberately absent, two tagged values are only ever summed structurally (as
/// a sum node in the marked tree) and aggregated at dictionary-building time.
#[derive(Clone, Debug, PartialEq)]
pub struct SemiMonomial {
    /// designated variable -> exponent
    pub powers: BTreeMap<String, f64>,
    /// variable-free (after normalization) coefficient expression
    pub coeff: Expr,
}

impl SemiMonomial {
    /// Tagged value for a designated variable leaf: `(v, 1)`.
    pub fn from_variable(name: &str) -> Self {
        let mut powers = BTreeMap::new();
        powers.insert(name.to_string(), 1.0);
        SemiMonomial {
            powers,
            coeff: Expr::Const(1.0),
        }
    }

    /// Tagged value for a variable-free subexpression: `(1, expr)`.
    pub fn from_coeff(expr: Expr) -> Self {
        SemiMonomial {
            powers: BTreeMap::new(),
            coeff: expr,
        }
    }

    /// The multiplicative unit `(1, 1)`.
    pub fn one() -> Self {
        SemiMonomial::from_coeff(Expr::Const(1.0))
    }

    /// The additive zero `(1, 0)`.
    pub fn zero() -> Self {
        SemiMonomial::from_coeff(Expr::Const(0.0))
    }

    /// Monomial parts multiply (exponent maps merge by summation), coefficient
    /// parts multiply.
    pub fn multiply(&self, other: &SemiMonomial) -> SemiMonomial {
        let mut powers = self.powers.clone();
        for (var, exp) in &other.powers {
            *powers.entry(var.clone()).or_insert(0.0) += exp;
        }
        powers.retain(|_, exp| *exp != 0.0);
        let coeff = (self.coeff.clone() * other.coeff.clone()).simplify_();
        SemiMonomial { powers, coeff }
    }

    /// Monomial parts divide (the divisor's exponents are subtracted, going
    /// negative where the divisor dominates), coefficient parts divide.
    pub fn divide(&self, other: &SemiMonomial) -> SemiMonomial {
        let mut powers = self.powers.clone();
        for (var, exp) in &other.powers {
            *powers.entry(var.clone()).or_insert(0.0) -= exp;
        }
        powers.retain(|_, exp| *exp != 0.0);
        let coeff = (self.coeff.clone() / other.coeff.clone()).simplify_();
        SemiMonomial { powers, coeff }
    }

    /// Monomial and coefficient each raised to a real exponent.
    pub fn power(&self, exponent: f64) -> SemiMonomial {
        let mut powers: BTreeMap<String, f64> = self
            .powers
            .iter()
            .map(|(var, exp)| (var.clone(), exp * exponent))
            .collect();
        powers.retain(|_, exp| *exp != 0.0);
        let coeff = self
            .coeff
            .clone()
            .pow(Expr::Const(exponent))
            .simplify_();
        SemiMonomial { powers, coeff }
    }

    /// True when the tagged value is the additive zero.
    pub fn is_zero(&self) -> bool {
        self.coeff.is_zero()
    }

    /// True exactly when the monomial part is the constant `1` and the
    /// coefficient folds to a plain number.
    pub fn is_real(&self) -> bool {
        self.to_real().is_some()
    }

    /// Reduction to a plain number, when possible.
    pub fn to_real(&self) -> Option<f64> {
        if self.powers.is_empty() {
            self.coeff.simplify_().as_const()
        } else {
            None
        }
    }

    /// The exponent map of the monomial part. Empty for a constant monomial.
    pub fn degree_map(&self) -> &BTreeMap<String, f64> {
        &self.powers
    }

    /// Sum of all exponents, 0 for a constant monomial.
    pub fn total_degree(&self) -> f64 {
        self.powers.values().sum()
    }

    /// Rebuilds the plain expression `coeff * (positive-exponent factors) /
    /// (negative-exponent factors)`.
    ///
    /// The exponent map is split by sign so that no monomial factor is emitted
    /// with a negative exponent.
    pub fn to_expr(&self) -> Expr {
        let mut numerator: Option<Expr> = match &self.coeff {
            Expr::Const(1.0) => None,
            other => Some(other.clone()),
        };
        let mut denominator: Option<Expr> = None;
        for (var, exp) in &self.powers {
            if *exp > 0.0 {
                let factor = monomial_factor(var, *exp);
                numerator = Some(match numerator {
                    Some(acc) => acc * factor,
                    None => factor,
                });
            } else if *exp < 0.0 {
                let factor = monomial_factor(var, -*exp);
                denominator = Some(match denominator {
                    Some(acc) => acc * factor,
                    None => factor,
                });
            }
        }
        let numerator = numerator.unwrap_or(Expr::Const(1.0));
        match denominator {
            Some(den) => numerator / den,
            None => numerator,
        }
    }
}

/// `v^exp` with the trivial exponent elided.
fn monomial_factor(var: &str, exp: f64) -> Expr {
    let var_expr = Expr::Var(var.to_string());
    if exp == 1.0 {
        var_expr
    } else {
        var_expr.pow(Expr::Const(exp))
    }
}

/// Ordered, duplicate-free set of designated variables with a derived
/// name -> column index map.
///
/// Duplicates or non-variable entries in the caller-supplied list are a
/// precondition violation and abort instead of being silently deduplicated.
#[derive(Clone, Debug)]
pub struct VarSet {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl VarSet {
    /// Builds the set from variable expressions, preserving caller order.
    pub fn new(vars: &[Expr]) -> Self {
        let mut names = Vec::with_capacity(vars.len());
        let mut index = HashMap::with_capacity(vars.len());
        for (i, var) in vars.iter().enumerate() {
            let name = match var {
                Expr::Var(name) => name.clone(),
                other => panic!("variable set entry {} is not a variable: {}", i, other),
            };
            if index.insert(name.clone(), i).is_some() {
                panic!("duplicate variable in variable set: {}", name);
            }
            names.push(name);
        }
        VarSet { names, index }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Column position of a variable in the caller-supplied order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Immutable marking configuration: the unary function heads that are
/// propagated through because they are linear in their argument at the origin.
///
/// None of the engine's built-in heads qualifies (negation, the usual suspect,
/// is already lowered to multiplication by -1), so the default table is empty;
/// a caller embedding this core next to a richer engine can whitelist heads
/// explicitly.
#[derive(Clone, Debug, Default)]
pub struct MarkerConfig {
    pub linear_unary: Vec<UnaryFunc>,
}

impl MarkerConfig {
    pub fn is_linear(&self, head: UnaryFunc) -> bool {
        self.linear_unary.contains(&head)
    }
}

/// Working tree produced by marking and consumed by normalization.
///
/// One variant per operator class: tagged value, n-ary sum, n-ary product,
/// division, power, and whitelisted unary function. The opaque fallback is a
/// tagged value whose monomial part is `1` and whose coefficient freezes the
/// subexpression with its interior variables deliberately unmarked.
#[derive(Clone, Debug, PartialEq)]
pub enum MarkedExpr {
    Term(SemiMonomial),
    Sum(Vec<MarkedExpr>),
    Prod(Vec<MarkedExpr>),
    Div(Box<MarkedExpr>, Box<MarkedExpr>),
    Pow(Box<MarkedExpr>, Box<MarkedExpr>),
    Func(UnaryFunc, Box<MarkedExpr>),
}

impl MarkedExpr {
    /// Sum constructor that splices nested sums into one argument list and
    /// collapses the degenerate arities.
    pub fn sum(items: Vec<MarkedExpr>) -> MarkedExpr {
        let mut flat = Vec::with_capacity(items.len());
        for item in items {
            match item {
                MarkedExpr::Sum(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => MarkedExpr::Term(SemiMonomial::zero()),
            1 => flat.into_iter().next().unwrap(),
            _ => MarkedExpr::Sum(flat),
        }
    }

    /// Product constructor, same splicing discipline as [`MarkedExpr::sum`].
    pub fn prod(items: Vec<MarkedExpr>) -> MarkedExpr {
        let mut flat = Vec::with_capacity(items.len());
        for item in items {
            match item {
                MarkedExpr::Prod(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => MarkedExpr::Term(SemiMonomial::one()),
            1 => flat.into_iter().next().unwrap(),
            _ => MarkedExpr::Prod(flat),
        }
    }

    /// The tagged value inside, if this node is one.
    pub fn as_term(&self) -> Option<&SemiMonomial> {
        match self {
            MarkedExpr::Term(sm) => Some(sm),
            _ => None,
        }
    }
}

/// Recursively rewrites `expr` into a marked tree over the designated
/// variables.
///
/// Classification per node:
/// - a designated variable leaf becomes the tagged value `(v, 1)`;
/// - any other true leaf becomes the opaque-coefficient tagged value `(1, leaf)`;
/// - `+`, `-`, `*` mark all operands and rebuild the additive/multiplicative
///   class (subtraction contributes its right operand scaled by -1);
/// - `/` and `^` mark both operands and rebuild the same node;
/// - `sqrt(a)` is rewritten to `a^(1/2)` and recursed into;
/// - a unary head in the whitelist is propagated through;
/// - everything else is frozen as an opaque coefficient, its interior
///   variables left unmarked so that the later dependency scan flags the term
///   as non-polynomial.
pub fn mark_vars(expr: &Expr, vars: &VarSet, config: &MarkerConfig) -> MarkedExpr {
    match expr {
        Expr::Var(name) if vars.contains(name) => {
            MarkedExpr::Term(SemiMonomial::from_variable(name))
        }
        Expr::Var(_) | Expr::Const(_) => {
            MarkedExpr::Term(SemiMonomial::from_coeff(expr.clone()))
        }
        Expr::Add(lhs, rhs) => MarkedExpr::sum(vec![
            mark_vars(lhs, vars, config),
            mark_vars(rhs, vars, config),
        ]),
        Expr::Sub(lhs, rhs) => MarkedExpr::sum(vec![
            mark_vars(lhs, vars, config),
            MarkedExpr::prod(vec![
                MarkedExpr::Term(SemiMonomial::from_coeff(Expr::Const(-1.0))),
                mark_vars(rhs, vars, config),
            ]),
        ]),
        Expr::Mul(lhs, rhs) => MarkedExpr::prod(vec![
            mark_vars(lhs, vars, config),
            mark_vars(rhs, vars, config),
        ]),
        Expr::Div(lhs, rhs) => MarkedExpr::Div(
            Box::new(mark_vars(lhs, vars, config)),
            Box::new(mark_vars(rhs, vars, config)),
        ),
        Expr::Pow(base, exp) => MarkedExpr::Pow(
            Box::new(mark_vars(base, vars, config)),
            Box::new(mark_vars(exp, vars, config)),
        ),
        Expr::sqrt(arg) => MarkedExpr::Pow(
            Box::new(mark_vars(arg, vars, config)),
            Box::new(MarkedExpr::Term(SemiMonomial::from_coeff(Expr::Const(0.5)))),
        ),
        other => match other.unary_head() {
            Some((head, arg)) if config.is_linear(head) => {
                MarkedExpr::Func(head, Box::new(mark_vars(arg, vars, config)))
            }
            // opaque coefficient: the variables inside stay unmarked on purpose,
            // the dependency scan over the coefficient flags the term later
            _ => MarkedExpr::Term(SemiMonomial::from_coeff(other.clone())),
        },
    }
}
