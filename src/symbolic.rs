#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// # Symbolic engine
/// the expression tree everything else operates on:
/// 1) create symbolic variables and expressions with natural operator syntax
/// 2) substitute variables and evaluate expressions numerically
/// 3) fold constants and basic identities in coefficient expressions
///# Example#
/// ```
/// use semipoly::symbolic::symbolic_engine::Expr;
/// let vars = Expr::Symbols("x, y");
/// let (x, y) = (vars[0].clone(), vars[1].clone());
/// let expr = x.clone() * x + Expr::Const(2.0) * y;
/// println!("expr {}", expr);
/// let value = expr.eval_expression(vec!["x", "y"], &[1.0, 2.0]);
/// println!("value {}", value);
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod symbolic_engine;
///____________________________________________________________________________________________________________________________
/// # Variable marker
/// first pass of the decomposition: tags every leaf as designated-variable
/// monomial or opaque coefficient and rebuilds the tree over tagged values,
/// rewriting sqrt into a fractional power on the way
pub mod symbolic_marker;
///____________________________________________________________________________________________________________________________
/// # Monomial normalizer
/// fixed-point rewrite loop collapsing tagged values across `*`, `/`, `^` and
/// distributing over `+`, plus the flattener that turns the result into a
/// list of additive terms
pub mod symbolic_normalize;
///____________________________________________________________________________________________________________________________
/// # Semi-polynomial forms
/// the public surface: monomial dictionary plus residual extraction, and the
/// sparse linear and quadratic system views built on top of it
///# Example#
/// ```
/// use semipoly::symbolic::symbolic_engine::Expr;
/// use semipoly::symbolic::symbolic_semipoly::semilinear_form;
/// let vars = Expr::Symbols("x, y");
/// let exprs = vec![
///     vars[0].clone() + Expr::Const(2.0) * vars[1].clone(),
///     Expr::Const(3.0) * vars[0].clone(),
/// ];
/// let (matrix, residuals) = semilinear_form(&exprs, &vars);
/// println!("rows {} cols {}", matrix.rows(), matrix.cols());
/// println!("residuals {:?}", residuals);
/// ```
pub mod symbolic_semipoly;
mod symbolic_semipoly_tests;
