//! End-to-end evaluation of notation input.

use calc_notation::{evaluate, Evaluator, NotationError};

fn ok(input: &str) -> String {
    match evaluate(input) {
        Ok(result) => result.rendered,
        Err(failure) => panic!("{input} failed: {failure} (parsed: {:?})", failure.parsed),
    }
}

#[test]
fn first_derivative() {
    assert_eq!(ok("d/dx(x^2)"), "2 * x");
    assert_eq!(ok("d/dx(sin(x))"), "cos(x)");
    assert_eq!(ok("d/dx(exp(x))"), "exp(x)");
    assert_eq!(ok("d/dx(ln(x))"), "1 / x");
}

#[test]
fn bare_operand_derivative() {
    assert_eq!(ok("d/dx sin x"), "cos(x)");
}

#[test]
fn second_derivative() {
    assert_eq!(ok("d²/dx²(sin(x))"), "-sin(x)");
    assert_eq!(ok("d^2/dx^2(sin(x))"), "-sin(x)");
    assert_eq!(ok("d²/dx²(x^3)"), "6 * x");
}

#[test]
fn ascii_second_derivative_survives_preprocessing() {
    // the `2` in `dx^2` triggers multiplication insertion before `(`
    assert_eq!(ok("d^2/dx^2(x^3)"), "6 * x");
    assert_eq!(ok("lim x->2(x^2)"), "4");
}

#[test]
fn partial_derivatives() {
    assert_eq!(ok("∂/∂x(sin(x))"), "cos(x)");
    assert_eq!(ok("∂/∂x(x*y)"), "y");
    assert_eq!(ok("∂²/∂x²(sin(x))"), "-sin(x)");
    assert_eq!(ok("∂²/∂x∂y(x*y)"), "1");
}

#[test]
fn indefinite_integral() {
    assert_eq!(ok("∫x^2 dx"), "x^3 / 3");
    assert_eq!(ok("∫sin(x) dx"), "-cos(x)");
}

#[test]
fn implicit_multiplication_in_integrand() {
    assert_eq!(ok("∫2x dx"), "x^2");
    assert_eq!(ok("∫2t dt"), "t^2");
}

#[test]
fn definite_integral() {
    assert_eq!(ok("∫_0^1 x^2 dx"), "1/3");
    assert_eq!(ok("∫_0^2 x dx"), "2");
}

#[test]
fn limits() {
    assert_eq!(ok("lim_{x->0}(sin(x)/x)"), "1");
    assert_eq!(ok("lim x->0 sin(x)/x"), "1");
    assert_eq!(ok("lim_{x->2}(x^2 + 1)"), "5");
    assert_eq!(ok("lim_{x->inf}(1/x)"), "0");
}

#[test]
fn power_operator_spellings() {
    assert_eq!(ok("d/dx(x**2)"), "2 * x");
}

#[test]
fn nested_form_identities() {
    assert_eq!(ok("∫(d/dx(x^2)) dx"), "x^2");
    assert_eq!(ok("d/dx(∫sin(t) dt)"), "sin(x)");
    assert_eq!(ok("d/dx(lim_{t->0}(sin(t)/t))"), "0");
    assert_eq!(ok("∫(lim_{t->x}(t^2)) dx"), "x^3 / 3");
}

#[test]
fn nesting_depth_three() {
    // derivative of integral in the same variable falls back to the generic
    // nested reduction and still terminates
    assert_eq!(ok("d/dx(∫(lim_{t->x}(t^2)) dx)"), "x^2");
}

#[test]
fn plain_algebra_simplifies() {
    assert_eq!(ok("2 + 3 * 4"), "14");
    assert_eq!(ok("2x + x"), "2 * x + x");
}

#[test]
fn canonical_form_reported() {
    let result = evaluate("d/dx(x^2)").unwrap();
    assert_eq!(result.parsed, "diff(x^2, x)");
    let result = evaluate("∫_0^1 x^2 dx").unwrap();
    assert_eq!(result.parsed, "integrate(x^2, (x, 0, 1))");
}

#[test]
fn steps_describe_the_resolution() {
    let result = evaluate("∫(d/dx(x^2)) dx").unwrap();
    assert!(result.steps.len() >= 2);
    assert!(result.steps[0].contains("Evaluating"));
    assert!(result
        .steps
        .iter()
        .any(|s| s.contains("Fundamental Theorem of Calculus")));
    assert!(result.steps.last().unwrap().contains("Result: x^2"));
}

#[test]
fn integral_steps_mention_the_constant() {
    let result = evaluate("∫x^2 dx").unwrap();
    assert!(result.steps.iter().any(|s| s.contains("+ C")));
}

#[test]
fn unbalanced_parens_fail_cleanly() {
    let failure = evaluate("d/dx(x^2").unwrap_err();
    assert!(matches!(failure.error, NotationError::Parse(_)));
    assert!(failure.parsed.is_some());
}

#[test]
fn integral_missing_differential_fails_cleanly() {
    let failure = evaluate("∫x^2").unwrap_err();
    assert!(matches!(
        failure.error,
        NotationError::UnsupportedNotation(_)
    ));
}

#[test]
fn unknown_function_fails_cleanly() {
    let failure = evaluate("d/dx(gamma(x))").unwrap_err();
    assert!(matches!(failure.error, NotationError::Engine(_)));
    assert_eq!(failure.parsed.as_deref(), Some("diff(gamma(x), x)"));
}

#[test]
fn tiny_budget_fails_with_rewrite_error() {
    let failure = Evaluator::with_budget(1)
        .evaluate("∫(d/dx(x^2)) dx")
        .unwrap_err();
    assert!(matches!(failure.error, NotationError::RewriteBudget));
}

#[test]
fn latex_rendering_available() {
    let result = evaluate("∫x^2 dx").unwrap();
    assert!(result.latex().contains("\\frac"));
}
