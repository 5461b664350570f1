//! Input normalization ahead of notation parsing.
//!
//! Pure string transforms, applied in order: power-operator normalization,
//! then implicit-multiplication insertion. Idempotent, and safe on text
//! containing multi-byte glyphs (`∫`, `∂`, `²`, `→`).

/// Normalize raw input: `**` becomes `^`, then implicit multiplication is
/// made explicit.
pub fn preprocess(input: &str) -> String {
    insert_multiplication(&input.replace("**", "^"))
}

/// Insert `*` between a digit and a following letter or `(`, and between a
/// `)` and a following letter.
///
/// The digit requirement on the left keeps multi-character names intact:
/// `sin` is never split, `2sin(x)` becomes `2*sin(x)`.
pub fn insert_multiplication(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 8);
    for (i, &c) in chars.iter().enumerate() {
        out.push(c);
        if let Some(&next) = chars.get(i + 1) {
            let after_digit = c.is_ascii_digit() && (next.is_ascii_alphabetic() || next == '(');
            let after_paren = c == ')' && next.is_ascii_alphabetic();
            if after_digit || after_paren {
                out.push('*');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_normalization() {
        assert_eq!(preprocess("x**2"), "x^2");
    }

    #[test]
    fn test_digit_letter_insertion() {
        assert_eq!(preprocess("2x"), "2*x");
        assert_eq!(preprocess("3(x)"), "3*(x)");
        assert_eq!(preprocess("2sin(x)"), "2*sin(x)");
    }

    #[test]
    fn test_paren_letter_insertion() {
        assert_eq!(preprocess("(x+1)x"), "(x+1)*x");
    }

    #[test]
    fn test_function_names_untouched() {
        assert_eq!(preprocess("sin(x)"), "sin(x)");
        assert_eq!(preprocess("sqrt(x)"), "sqrt(x)");
    }

    #[test]
    fn test_notation_glyphs_untouched() {
        assert_eq!(preprocess("∫x^2 dx"), "∫x^2 dx");
        assert_eq!(preprocess("∂/∂x(x*y)"), "∂/∂x(x*y)");
    }

    #[test]
    fn test_idempotent() {
        let once = preprocess("2x + 3(y**2)");
        assert_eq!(preprocess(&once), once);
    }
}
