//! Recursive-descent recognizer for calculus notation.
//!
//! Each construct is anchored on its operator glyph (`d/d`, `d²/d…²`,
//! `∂/∂…`, `∫`, `lim`). Recognition order matters: second-order forms are
//! tried before first-order ones so `d²/dx²` is never consumed as `d/dx`,
//! and definite integrals are tried before indefinite ones. Operands are
//! parsed recursively, so nesting falls out of the structure instead of
//! iterated text substitution.
//!
//! A parenthesized operand is the balanced group; an unparenthesized operand
//! runs to the end of the text. The latter is deliberately permissive and
//! implementation-defined on malformed input.

use crate::ast::CalcNode;
use crate::error::NotationError;

const FUNCTION_NAMES: &[&str] = &["sin", "cos", "tan", "exp", "ln", "log", "sqrt", "abs"];

/// Parse preprocessed text into a typed operator tree.
///
/// Text that anchors no construct becomes [`CalcNode::Algebraic`]; text that
/// contains notation glyphs but fits no rule is rejected as
/// [`NotationError::UnsupportedNotation`].
pub fn parse(text: &str) -> Result<CalcNode, NotationError> {
    let text = text.trim();
    if let Some(node) = parse_second_derivative(text)? {
        return Ok(node);
    }
    if let Some(node) = parse_partial(text)? {
        return Ok(node);
    }
    if let Some(node) = parse_derivative(text)? {
        return Ok(node);
    }
    if let Some(node) = parse_integral(text)? {
        return Ok(node);
    }
    if let Some(node) = parse_limit(text)? {
        return Ok(node);
    }
    if looks_like_notation(text) {
        return Err(NotationError::UnsupportedNotation(text.to_string()));
    }
    Ok(CalcNode::Algebraic(normalize_bare_call(text)))
}

fn parse_second_derivative(text: &str) -> Result<Option<CalcNode>, NotationError> {
    let (rest, closer) = if let Some(r) = text.strip_prefix("d²/d") {
        (r, "²")
    } else if let Some(r) = text.strip_prefix("d^2/d") {
        (r, "^2")
    } else {
        return Ok(None);
    };
    let Some((var, rest)) = take_var(rest) else {
        return Ok(None);
    };
    let Some(rest) = rest.strip_prefix(closer) else {
        return Ok(None);
    };
    let expr = operand(rest)?;
    Ok(Some(CalcNode::Derivative {
        order: 2,
        var,
        expr: Box::new(expr),
    }))
}

fn parse_partial(text: &str) -> Result<Option<CalcNode>, NotationError> {
    if let Some(rest) = text.strip_prefix("∂²/∂") {
        let Some((v1, rest)) = take_var(rest) else {
            return Ok(None);
        };
        if let Some(rest) = rest.strip_prefix('²') {
            let expr = operand(rest)?;
            return Ok(Some(CalcNode::Partial {
                vars: vec![v1.clone(), v1],
                expr: Box::new(expr),
            }));
        }
        if let Some(rest) = rest.strip_prefix('∂') {
            let Some((v2, rest)) = take_var(rest) else {
                return Ok(None);
            };
            let expr = operand(rest)?;
            return Ok(Some(CalcNode::Partial {
                vars: vec![v1, v2],
                expr: Box::new(expr),
            }));
        }
        return Ok(None);
    }
    if let Some(rest) = text.strip_prefix("∂/∂") {
        let Some((var, rest)) = take_var(rest) else {
            return Ok(None);
        };
        let expr = operand(rest)?;
        return Ok(Some(CalcNode::Partial {
            vars: vec![var],
            expr: Box::new(expr),
        }));
    }
    Ok(None)
}

fn parse_derivative(text: &str) -> Result<Option<CalcNode>, NotationError> {
    let Some(rest) = text.strip_prefix("d/d") else {
        return Ok(None);
    };
    let Some((var, rest)) = take_var(rest) else {
        return Ok(None);
    };
    let expr = operand(rest)?;
    Ok(Some(CalcNode::Derivative {
        order: 1,
        var,
        expr: Box::new(expr),
    }))
}

fn parse_integral(text: &str) -> Result<Option<CalcNode>, NotationError> {
    let Some(rest) = text.strip_prefix('∫') else {
        return Ok(None);
    };
    let (bounds, rest) = match rest.strip_prefix('_') {
        Some(after) => {
            let Some((lower, upper, after)) = parse_bounds(after) else {
                return Err(NotationError::UnsupportedNotation(text.to_string()));
            };
            (Some((lower, upper)), after)
        }
        None => (None, rest),
    };
    let Some((body, var)) = split_differential(rest) else {
        return Err(NotationError::UnsupportedNotation(text.to_string()));
    };
    let expr = operand(body)?;
    Ok(Some(CalcNode::Integral {
        var,
        bounds,
        expr: Box::new(expr),
    }))
}

/// `lower^upper` after the `∫_`. The upper bound ends at whitespace or `(`;
/// a trailing `*` left by multiplication insertion is dropped.
fn parse_bounds(text: &str) -> Option<(String, String, &str)> {
    let caret = text.find('^')?;
    let lower = text[..caret].trim();
    if lower.is_empty() {
        return None;
    }
    let rest = &text[caret + 1..];
    let mut upper_end = rest.len();
    for (i, c) in rest.char_indices() {
        if c.is_whitespace() || c == '(' {
            upper_end = i;
            break;
        }
    }
    let upper = rest[..upper_end].trim_end_matches('*').trim();
    if upper.is_empty() {
        return None;
    }
    Some((lower.to_string(), upper.to_string(), &rest[upper_end..]))
}

/// Locate the trailing differential `dv` at paren depth 0, scanning for the
/// last candidate. Returns the body text and the integration variable.
fn split_differential(text: &str) -> Option<(&str, String)> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut depth = 0i32;
    let mut found: Option<(usize, char)> = None;
    for (k, &(i, c)) in chars.iter().enumerate() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            'd' if depth == 0 => {
                if let Some(&(_, v)) = chars.get(k + 1) {
                    let boundary = chars.get(k + 2).is_none_or(|&(_, a)| a.is_whitespace());
                    if v.is_ascii_lowercase() && boundary {
                        found = Some((i, v));
                    }
                }
            }
            _ => {}
        }
    }
    found.map(|(i, v)| (text[..i].trim_end(), v.to_string()))
}

fn parse_limit(text: &str) -> Result<Option<CalcNode>, NotationError> {
    let Some(rest) = text.strip_prefix("lim") else {
        return Ok(None);
    };
    // a separator keeps ordinary identifiers starting with `lim` algebraic
    if !(rest.starts_with('_') || rest.starts_with('{') || rest.starts_with(char::is_whitespace)) {
        return Ok(None);
    }
    let mut rest = rest;
    if let Some(r) = rest.strip_prefix('_') {
        rest = r;
    }
    rest = rest.trim_start();
    let braced = rest.starts_with('{');
    if let Some(r) = rest.strip_prefix('{') {
        rest = r;
    }
    let rest = rest.trim_start();
    let Some((var, rest)) = take_var(rest) else {
        return Err(NotationError::UnsupportedNotation(text.to_string()));
    };
    let rest = rest.trim_start();
    let rest = if let Some(r) = rest.strip_prefix("->") {
        r
    } else if let Some(r) = rest.strip_prefix('→') {
        r
    } else {
        return Err(NotationError::UnsupportedNotation(text.to_string()));
    };
    let rest = rest.trim_start();
    let (target, rest) = if braced {
        let Some(close) = rest.find('}') else {
            return Err(NotationError::UnsupportedNotation(text.to_string()));
        };
        (rest[..close].trim().to_string(), &rest[close + 1..])
    } else {
        let mut end = rest.len();
        for (i, c) in rest.char_indices() {
            if c.is_whitespace() || c == '(' {
                end = i;
                break;
            }
        }
        (rest[..end].trim_end_matches('*').to_string(), &rest[end..])
    };
    if target.is_empty() {
        return Err(NotationError::UnsupportedNotation(text.to_string()));
    }
    let expr = operand(rest)?;
    Ok(Some(CalcNode::Limit {
        var,
        target,
        expr: Box::new(expr),
    }))
}

fn operand(rest: &str) -> Result<CalcNode, NotationError> {
    parse(operand_text(rest))
}

fn operand_text(rest: &str) -> &str {
    let rest = rest.trim();
    // multiplication insertion leaves a `*` between a digit closer like
    // `^2` and a parenthesized operand; drop it, as parse_bounds does
    let rest = rest.strip_prefix('*').map_or(rest, str::trim_start);
    if let Some((inner, after)) = balanced_group(rest) {
        if after.trim().is_empty() {
            return inner;
        }
    }
    rest
}

/// Contents of a leading balanced paren group plus the remainder after it.
fn balanced_group(text: &str) -> Option<(&str, &str)> {
    if !text.starts_with('(') {
        return None;
    }
    let mut depth = 0u32;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&text[1..i], &text[i + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

fn take_var(text: &str) -> Option<(String, &str)> {
    let c = text.chars().next()?;
    if c.is_ascii_lowercase() {
        Some((c.to_string(), &text[1..]))
    } else {
        None
    }
}

fn looks_like_notation(text: &str) -> bool {
    text.contains('∫')
        || text.contains('∂')
        || text.contains("d/d")
        || text.contains("d²")
        || text.contains("d^2/")
        || text
            .split_whitespace()
            .any(|t| t == "lim" || t.starts_with("lim_") || t.starts_with("lim{"))
}

/// `sin x` -> `sin(x)`: the engine parser requires explicit call syntax.
fn normalize_bare_call(text: &str) -> String {
    let mut parts = text.split_whitespace();
    if let (Some(name), Some(arg), None) = (parts.next(), parts.next(), parts.next()) {
        if FUNCTION_NAMES.contains(&name) && arg.chars().all(|c| c.is_ascii_alphanumeric()) {
            return format!("{name}({arg})");
        }
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alg(s: &str) -> Box<CalcNode> {
        Box::new(CalcNode::Algebraic(s.to_string()))
    }

    #[test]
    fn test_plain_algebraic() {
        assert_eq!(parse("x^2 + 1").unwrap(), CalcNode::Algebraic("x^2 + 1".into()));
    }

    #[test]
    fn test_first_derivative() {
        assert_eq!(
            parse("d/dx(x^2)").unwrap(),
            CalcNode::Derivative {
                order: 1,
                var: "x".into(),
                expr: alg("x^2"),
            }
        );
    }

    #[test]
    fn test_bare_operand_runs_to_end() {
        assert_eq!(
            parse("d/dx sin x").unwrap(),
            CalcNode::Derivative {
                order: 1,
                var: "x".into(),
                expr: alg("sin(x)"),
            }
        );
    }

    #[test]
    fn test_second_derivative_both_spellings() {
        let expected = CalcNode::Derivative {
            order: 2,
            var: "x".into(),
            expr: alg("sin(x)"),
        };
        assert_eq!(parse("d²/dx²(sin(x))").unwrap(), expected);
        assert_eq!(parse("d^2/dx^2(sin(x))").unwrap(), expected);
    }

    #[test]
    fn test_inserted_star_before_operand_tolerated() {
        // the preprocessor writes `d^2/dx^2*(...)` and `lim x->2*(...)`
        assert_eq!(
            parse("d^2/dx^2*(sin(x))").unwrap(),
            CalcNode::Derivative {
                order: 2,
                var: "x".into(),
                expr: alg("sin(x)"),
            }
        );
        assert_eq!(
            parse("lim x->2*(x^2)").unwrap(),
            CalcNode::Limit {
                var: "x".into(),
                target: "2".into(),
                expr: alg("x^2"),
            }
        );
    }

    #[test]
    fn test_partials() {
        assert_eq!(
            parse("∂/∂x(x*y)").unwrap(),
            CalcNode::Partial {
                vars: vec!["x".into()],
                expr: alg("x*y"),
            }
        );
        assert_eq!(
            parse("∂²/∂x²(sin(x))").unwrap(),
            CalcNode::Partial {
                vars: vec!["x".into(), "x".into()],
                expr: alg("sin(x)"),
            }
        );
        assert_eq!(
            parse("∂²/∂x∂y(x*y)").unwrap(),
            CalcNode::Partial {
                vars: vec!["x".into(), "y".into()],
                expr: alg("x*y"),
            }
        );
    }

    #[test]
    fn test_indefinite_integral() {
        assert_eq!(
            parse("∫x^2 dx").unwrap(),
            CalcNode::Integral {
                var: "x".into(),
                bounds: None,
                expr: alg("x^2"),
            }
        );
    }

    #[test]
    fn test_definite_integral() {
        assert_eq!(
            parse("∫_0^1 x^2 dx").unwrap(),
            CalcNode::Integral {
                var: "x".into(),
                bounds: Some(("0".into(), "1".into())),
                expr: alg("x^2"),
            }
        );
    }

    #[test]
    fn test_limit_braced_and_bare() {
        let expected = CalcNode::Limit {
            var: "x".into(),
            target: "0".into(),
            expr: alg("sin(x)/x"),
        };
        assert_eq!(parse("lim_{x->0}(sin(x)/x)").unwrap(), expected);
        assert_eq!(parse("lim x->0 sin(x)/x").unwrap(), expected);
    }

    #[test]
    fn test_limit_unicode_arrow() {
        assert_eq!(
            parse("lim_{x→0}(x)").unwrap(),
            CalcNode::Limit {
                var: "x".into(),
                target: "0".into(),
                expr: alg("x"),
            }
        );
    }

    #[test]
    fn test_nested_integral_of_derivative() {
        assert_eq!(
            parse("∫(d/dx(x^2)) dx").unwrap(),
            CalcNode::Integral {
                var: "x".into(),
                bounds: None,
                expr: Box::new(CalcNode::Derivative {
                    order: 1,
                    var: "x".into(),
                    expr: alg("x^2"),
                }),
            }
        );
    }

    #[test]
    fn test_nested_derivative_of_integral() {
        assert_eq!(
            parse("d/dx(∫sin(t) dt)").unwrap(),
            CalcNode::Derivative {
                order: 1,
                var: "x".into(),
                expr: Box::new(CalcNode::Integral {
                    var: "t".into(),
                    bounds: None,
                    expr: alg("sin(t)"),
                }),
            }
        );
    }

    #[test]
    fn test_nested_derivative_of_limit() {
        assert_eq!(
            parse("d/dx(lim_{t->0}(sin(t)/t))").unwrap(),
            CalcNode::Derivative {
                order: 1,
                var: "x".into(),
                expr: Box::new(CalcNode::Limit {
                    var: "t".into(),
                    target: "0".into(),
                    expr: alg("sin(t)/t"),
                }),
            }
        );
    }

    #[test]
    fn test_integral_without_differential_rejected() {
        assert!(matches!(
            parse("∫x^2"),
            Err(NotationError::UnsupportedNotation(_))
        ));
    }

    #[test]
    fn test_glyphs_without_rule_rejected() {
        assert!(matches!(
            parse("2 * ∂x"),
            Err(NotationError::UnsupportedNotation(_))
        ));
    }

    #[test]
    fn test_canonical_has_no_glyphs() {
        let node = parse("∫(d/dx(x^2)) dx").unwrap();
        let canonical = node.canonical();
        for glyph in ["∫", "∂", "²", "lim_{", "d/d"] {
            assert!(!canonical.contains(glyph), "found {glyph} in {canonical}");
        }
    }
}
