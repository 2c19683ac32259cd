#[cfg(test)]
mod tests {
    use crate::symbolic::symbolic_engine::Expr;
    use crate::symbolic::symbolic_semipoly::{
        MonomialKey, column_to_pair, pair_to_column, semilinear_form, semipolynomial_forms,
        semiquadratic_form,
    };
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, DVector};
    use rand::Rng;
    use sprs::CsMat;

    fn var(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    fn cross_key(a: &str, b: &str) -> MonomialKey {
        let mut key = MonomialKey::constant();
        key.0.insert(a.to_string(), 1);
        key.0.insert(b.to_string(), 1);
        key
    }

    /// Evaluates `sum(coeff * monomial) + residual` and the input at random
    /// assignments and checks they agree.
    fn check_reconstruction(expr: &Expr, vars: &[Expr], degree: f64, consts: bool, names: &[&str]) {
        let (dict, residual) = expr.semipolynomial_form(vars, degree, consts);
        let mut rng = rand::rng();
        for _ in 0..20 {
            let values: Vec<f64> = names.iter().map(|_| rng.random_range(0.5..2.0)).collect();
            let mut total = residual.eval_expression(names.to_vec(), &values);
            for (key, coeff) in &dict {
                total += key.to_expr().eval_expression(names.to_vec(), &values)
                    * coeff.eval_expression(names.to_vec(), &values);
            }
            let expected = expr.eval_expression(names.to_vec(), &values);
            assert_relative_eq!(total, expected, max_relative = 1e-9);
        }
    }

    /// Evaluates a sparse symbolic matrix entrywise into a dense numeric one.
    fn eval_matrix(
        matrix: &CsMat<Expr>,
        names: &[&str],
        values: &[f64],
    ) -> DMatrix<f64> {
        let mut dense = DMatrix::zeros(matrix.rows(), matrix.cols());
        for (entry, (row, col)) in matrix.iter() {
            dense[(row, col)] = entry.eval_expression(names.to_vec(), values);
        }
        dense
    }

    fn eval_vector(exprs: &[Expr], names: &[&str], values: &[f64]) -> DVector<f64> {
        DVector::from_iterator(
            exprs.len(),
            exprs
                .iter()
                .map(|expr| expr.eval_expression(names.to_vec(), values)),
        )
    }

    #[test]
    fn test_worked_example_dictionary_and_residual() {
        // 3*x^2 + 2*x*y + y + 5 + sin(x) at degree 2
        let vars = Expr::Symbols("x, y");
        let (x, y) = (var("x"), var("y"));
        let expr = Expr::Const(3.0) * x.clone() * x.clone()
            + Expr::Const(2.0) * x.clone() * y.clone()
            + y.clone()
            + Expr::Const(5.0)
            + Expr::sin(x.clone().boxed());
        let (dict, residual) = expr.semipolynomial_form(&vars, 2.0, true);

        assert_eq!(dict.len(), 4);
        assert_eq!(dict.get(&MonomialKey::variable("x", 2)), Some(&Expr::Const(3.0)));
        assert_eq!(dict.get(&cross_key("x", "y")), Some(&Expr::Const(2.0)));
        assert_eq!(dict.get(&MonomialKey::variable("y", 1)), Some(&Expr::Const(1.0)));
        assert_eq!(dict.get(&MonomialKey::constant()), Some(&Expr::Const(5.0)));
        assert_eq!(residual, Expr::sin(x.boxed()));
    }

    #[test]
    fn test_idempotence_on_plain_polynomial() {
        // already a sum of bounded monomials with variable-free coefficients
        let vars = Expr::Symbols("x, y");
        let (x, y) = (var("x"), var("y"));
        let expr = Expr::Const(4.0) * x.clone().pow(Expr::Const(2.0))
            + Expr::Const(-2.0) * y.clone()
            + Expr::Const(7.0);
        let (dict, residual) = expr.semipolynomial_form(&vars, 2.0, true);
        assert_eq!(residual, Expr::Const(0.0));
        assert_eq!(dict.get(&MonomialKey::variable("x", 2)), Some(&Expr::Const(4.0)));
        assert_eq!(dict.get(&MonomialKey::variable("y", 1)), Some(&Expr::Const(-2.0)));
        assert_eq!(dict.get(&MonomialKey::constant()), Some(&Expr::Const(7.0)));
    }

    #[test]
    fn test_like_terms_aggregate_on_key_collision() {
        let vars = Expr::Symbols("x");
        let x = var("x");
        let expr = Expr::Const(3.0) * x.clone() + Expr::Const(2.0) * x.clone();
        let (dict, residual) = expr.semipolynomial_form(&vars, 1.0, true);
        assert_eq!(dict.get(&MonomialKey::variable("x", 1)), Some(&Expr::Const(5.0)));
        assert_eq!(residual, Expr::Const(0.0));
    }

    #[test]
    fn test_symbolic_coefficients_stay_symbolic() {
        // a*x + b with only x designated
        let vars = Expr::Symbols("x");
        let expr = var("a") * var("x") + var("b");
        let (dict, residual) = expr.semipolynomial_form(&vars, 1.0, true);
        assert_eq!(dict.get(&MonomialKey::variable("x", 1)), Some(&var("a")));
        assert_eq!(dict.get(&MonomialKey::constant()), Some(&var("b")));
        assert_eq!(residual, Expr::Const(0.0));
    }

    #[test]
    fn test_degree_bound_is_respected() {
        let vars = Expr::Symbols("x");
        let x = var("x");
        let expr = x.clone().pow(Expr::Const(3.0)) + x.clone();
        let (dict, residual) = expr.semipolynomial_form(&vars, 2.0, true);
        assert!(dict.keys().all(|key| f64::from(key.total_degree()) <= 2.0));
        assert_eq!(dict.get(&MonomialKey::variable("x", 1)), Some(&Expr::Const(1.0)));
        assert_eq!(dict.get(&MonomialKey::variable("x", 3)), None);
        assert_eq!(residual, x.pow(Expr::Const(3.0)));
    }

    #[test]
    fn test_degree_zero_keeps_only_constants() {
        let vars = Expr::Symbols("x");
        let expr = var("x") + Expr::Const(7.0);
        let (dict, residual) = expr.semipolynomial_form(&vars, 0.0, true);
        assert!(dict.keys().all(MonomialKey::is_constant));
        assert_eq!(dict.get(&MonomialKey::constant()), Some(&Expr::Const(7.0)));
        assert_eq!(residual, var("x"));
    }

    #[test]
    fn test_constants_flag_excludes_constant_key() {
        let vars = Expr::Symbols("x");
        let expr = var("x") + Expr::Const(5.0);
        let (dict, residual) = expr.semipolynomial_form(&vars, 1.0, false);
        assert!(dict.keys().all(|key| !key.is_constant()));
        assert_eq!(residual, Expr::Const(5.0));
    }

    #[test]
    fn test_unbounded_polynomial_coeffs() {
        let vars = Expr::Symbols("x, y");
        let (x, y) = (var("x"), var("y"));
        let expr = x.clone().pow(Expr::Const(5.0)) * y.clone()
            + Expr::Const(2.0) * y.clone().pow(Expr::Const(3.0));
        let (dict, residual) = expr.polynomial_coeffs(&vars);
        assert_eq!(residual, Expr::Const(0.0));
        let mut quintic = MonomialKey::variable("x", 5);
        quintic.0.insert("y".to_string(), 1);
        assert_eq!(dict.get(&quintic), Some(&Expr::Const(1.0)));
        assert_eq!(dict.get(&MonomialKey::variable("y", 3)), Some(&Expr::Const(2.0)));
    }

    #[test]
    fn test_negative_degree_guard() {
        crate::Utils::logger::init_console_logger(simplelog::LevelFilter::Warn);
        let vars = Expr::Symbols("x");
        let expr = var("x") * var("x") + Expr::Const(1.0);
        let (dict, residual) = expr.semipolynomial_form(&vars, -1.0, true);
        assert!(dict.is_empty());
        assert_eq!(residual, expr);
        // the vectorized variant guards the same way
        let (dicts, residuals) = semipolynomial_forms(&[expr.clone()], &vars, -2.0, true);
        assert!(dicts[0].is_empty());
        assert_eq!(residuals[0], expr);
    }

    #[test]
    fn test_negative_exponent_goes_to_residual() {
        let vars = Expr::Symbols("x, y");
        let expr = var("x") / var("y") + var("x");
        let (dict, residual) = expr.semipolynomial_form(&vars, 2.0, true);
        assert_eq!(dict.get(&MonomialKey::variable("x", 1)), Some(&Expr::Const(1.0)));
        assert_eq!(dict.len(), 1);
        assert_eq!(residual, var("x") / var("y"));
    }

    #[test]
    fn test_fractional_exponent_goes_to_residual() {
        let vars = Expr::Symbols("x");
        let expr = Expr::sqrt(var("x").boxed()) + var("x");
        let (dict, residual) = expr.semipolynomial_form(&vars, 2.0, true);
        assert_eq!(dict.get(&MonomialKey::variable("x", 1)), Some(&Expr::Const(1.0)));
        assert_eq!(residual, var("x").pow(Expr::Const(0.5)));
    }

    #[test]
    fn test_power_of_sum_is_expanded() {
        let vars = Expr::Symbols("x, y");
        let sum = var("x") + var("y");
        let expr = sum.pow(Expr::Const(2.0));
        let (dict, residual) = expr.semipolynomial_form(&vars, 2.0, true);
        assert_eq!(residual, Expr::Const(0.0));
        assert_eq!(dict.get(&MonomialKey::variable("x", 2)), Some(&Expr::Const(1.0)));
        assert_eq!(dict.get(&MonomialKey::variable("y", 2)), Some(&Expr::Const(1.0)));
        assert_eq!(dict.get(&cross_key("x", "y")), Some(&Expr::Const(2.0)));
    }

    #[test]
    fn test_opaque_function_of_designated_variable_is_residual() {
        let vars = Expr::Symbols("x");
        let expr = var("x") * Expr::cos(var("x").boxed());
        let (dict, residual) = expr.semipolynomial_form(&vars, 2.0, true);
        assert!(dict.is_empty());
        // the cos(x) coefficient still depends on x, so the whole term is rejected
        assert_eq!(residual, Expr::cos(var("x").boxed()) * var("x"));
    }

    #[test]
    fn test_function_of_foreign_variable_is_a_coefficient() {
        let vars = Expr::Symbols("x");
        let expr = Expr::Exp(var("t").boxed()) * var("x");
        let (dict, residual) = expr.semipolynomial_form(&vars, 1.0, true);
        assert_eq!(
            dict.get(&MonomialKey::variable("x", 1)),
            Some(&Expr::Exp(var("t").boxed()))
        );
        assert_eq!(residual, Expr::Const(0.0));
    }

    #[test]
    fn test_reconstruction_law_random_assignments() {
        let vars = Expr::Symbols("x, y");
        let (x, y) = (var("x"), var("y"));
        let cases = vec![
            Expr::Const(3.0) * x.clone() * x.clone()
                + Expr::Const(2.0) * x.clone() * y.clone()
                + y.clone()
                + Expr::Const(5.0)
                + Expr::sin(x.clone().boxed()),
            (x.clone() + y.clone()).pow(Expr::Const(3.0)),
            x.clone() / y.clone() + x.clone().sqrt_() + var("a") * x.clone(),
            y.clone().exp() * x.clone() - y.clone() / Expr::Const(2.0),
            var("a").ln() + x.clone() * y.clone() * y.clone(),
        ];
        for expr in &cases {
            for degree in [0.0, 1.0, 2.0, f64::INFINITY] {
                check_reconstruction(expr, &vars, degree, true, &["x", "y", "a"]);
                check_reconstruction(expr, &vars, degree, false, &["x", "y", "a"]);
            }
        }
    }

    #[test]
    fn test_vectorized_form_preserves_order() {
        let vars = Expr::Symbols("x");
        let exprs = vec![var("x"), Expr::Const(2.0) * var("x"), Expr::Const(9.0)];
        let (dicts, residuals) = semipolynomial_forms(&exprs, &vars, 1.0, true);
        assert_eq!(dicts.len(), 3);
        assert_eq!(residuals.len(), 3);
        assert_eq!(dicts[0].get(&MonomialKey::variable("x", 1)), Some(&Expr::Const(1.0)));
        assert_eq!(dicts[1].get(&MonomialKey::variable("x", 1)), Some(&Expr::Const(2.0)));
        assert_eq!(dicts[2].get(&MonomialKey::constant()), Some(&Expr::Const(9.0)));
        assert!(residuals.iter().all(|r| *r == Expr::Const(0.0)));
    }

    #[test]
    fn test_semilinear_form_worked_example() {
        // [x + 2*y, 3*x] over {x, y} -> rows [1, 2] and [3, 0], residual [0, 0]
        let vars = Expr::Symbols("x, y");
        let exprs = vec![
            var("x") + Expr::Const(2.0) * var("y"),
            Expr::Const(3.0) * var("x"),
        ];
        let (a, residuals) = semilinear_form(&exprs, &vars);
        assert_eq!(a.rows(), 2);
        assert_eq!(a.cols(), 2);
        assert_eq!(a.get(0, 0), Some(&Expr::Const(1.0)));
        assert_eq!(a.get(0, 1), Some(&Expr::Const(2.0)));
        assert_eq!(a.get(1, 0), Some(&Expr::Const(3.0)));
        assert_eq!(a.get(1, 1), None);
        assert!(residuals.iter().all(|r| *r == Expr::Const(0.0)));
    }

    #[test]
    fn test_semilinear_identity_holds() {
        let vars = Expr::Symbols("x, y");
        let (x, y) = (var("x"), var("y"));
        let exprs = vec![
            var("a") * x.clone() + Expr::Const(2.0) * y.clone() + Expr::sin(y.clone().boxed()),
            x.clone() * x.clone() + y.clone(),
            Expr::Const(4.0),
        ];
        let (a, residuals) = semilinear_form(&exprs, &vars);
        let names = ["x", "y", "a"];
        let mut rng = rand::rng();
        for _ in 0..10 {
            let values: Vec<f64> = names.iter().map(|_| rng.random_range(0.5..2.0)).collect();
            let a_num = eval_matrix(&a, &names, &values);
            let v = DVector::from_vec(vec![values[0], values[1]]);
            let lhs = a_num * v + eval_vector(&residuals, &names, &values);
            let rhs = eval_vector(&exprs, &names, &values);
            for i in 0..exprs.len() {
                assert_relative_eq!(lhs[i], rhs[i], max_relative = 1e-9);
            }
        }
    }

    #[test]
    fn test_semiquadratic_form_populates_both_matrices() {
        let vars = Expr::Symbols("x, y");
        let (x, y) = (var("x"), var("y"));
        let exprs = vec![
            Expr::Const(3.0) * x.clone() * x.clone()
                + Expr::Const(2.0) * x.clone() * y.clone()
                + y.clone(),
            x.clone() + y.clone() * y.clone(),
        ];
        let (a1, a2, v2, residuals) = semiquadratic_form(&exprs, &vars);
        assert_eq!(a1.cols(), 2);
        assert_eq!(a2.cols(), 3);
        assert_eq!(v2.len(), 3);
        // row 0: 3*x^2 at column (0,0), 2*x*y at column (0,1), y linear
        assert_eq!(a2.get(0, pair_to_column(0, 0)), Some(&Expr::Const(3.0)));
        assert_eq!(a2.get(0, pair_to_column(0, 1)), Some(&Expr::Const(2.0)));
        assert_eq!(a1.get(0, 1), Some(&Expr::Const(1.0)));
        // row 1: x linear, y^2 at column (1,1)
        assert_eq!(a1.get(1, 0), Some(&Expr::Const(1.0)));
        assert_eq!(a2.get(1, pair_to_column(1, 1)), Some(&Expr::Const(1.0)));
        // populated v2 slots carry the literal monomials, empty ones are zero
        assert_eq!(v2[pair_to_column(0, 0)], x.clone().pow(Expr::Const(2.0)));
        assert_eq!(v2[pair_to_column(0, 1)], x * y.clone());
        assert_eq!(v2[pair_to_column(1, 1)], y.pow(Expr::Const(2.0)));
        assert!(residuals.iter().all(|r| *r == Expr::Const(0.0)));
    }

    #[test]
    fn test_semiquadratic_identity_holds() {
        let vars = Expr::Symbols("x, y, z");
        let (x, y, z) = (var("x"), var("y"), var("z"));
        let exprs = vec![
            x.clone() * y.clone() + z.clone() * z.clone() + Expr::Const(1.0),
            var("a") * y.clone() * z.clone() + x.clone() + Expr::tg(x.clone().boxed()),
            (x.clone() + y.clone()).pow(Expr::Const(2.0)) - z.clone(),
        ];
        let (a1, a2, v2, residuals) = semiquadratic_form(&exprs, &vars);
        let names = ["x", "y", "z", "a"];
        let mut rng = rand::rng();
        for _ in 0..10 {
            let values: Vec<f64> = names.iter().map(|_| rng.random_range(0.5..2.0)).collect();
            let a1_num = eval_matrix(&a1, &names, &values);
            let a2_num = eval_matrix(&a2, &names, &values);
            let v = DVector::from_vec(vec![values[0], values[1], values[2]]);
            let v2_num = eval_vector(&v2, &names, &values);
            let lhs = a1_num * v + a2_num * v2_num + eval_vector(&residuals, &names, &values);
            let rhs = eval_vector(&exprs, &names, &values);
            for i in 0..exprs.len() {
                assert_relative_eq!(lhs[i], rhs[i], max_relative = 1e-9);
            }
        }
    }

    #[test]
    fn test_pair_column_coding_round_trips() {
        for q in 0..6 {
            for p in 0..=q {
                let col = pair_to_column(p, q);
                assert_eq!(column_to_pair(col), (p, q));
            }
        }
        // the layout for n variables is contiguous over n*(n+1)/2 columns
        let columns: Vec<usize> = (0..4)
            .flat_map(|q| (0..=q).map(move |p| pair_to_column(p, q)))
            .collect();
        let mut sorted = columns.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..10).collect::<Vec<usize>>());
    }

    #[test]
    #[should_panic(expected = "duplicate variable")]
    fn test_duplicate_variables_abort_matrix_builders() {
        let x = var("x");
        semilinear_form(&[x.clone()], &[x.clone(), x]);
    }
}
