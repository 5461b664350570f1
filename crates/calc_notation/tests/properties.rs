//! Property tests: preprocessing idempotence and bounded termination.

use calc_notation::{evaluate, preprocess};
use proptest::prelude::*;

fn notation_strategy() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        Just("x^2".to_string()),
        Just("sin(x)".to_string()),
        Just("2*x".to_string()),
        Just("x + 1".to_string()),
    ];
    leaf.prop_recursive(3, 8, 1, |inner| {
        prop_oneof![
            inner.clone().prop_map(|e| format!("d/dx({e})")),
            inner.clone().prop_map(|e| format!("d²/dx²({e})")),
            inner.clone().prop_map(|e| format!("∂/∂x({e})")),
            inner.clone().prop_map(|e| format!("∫({e}) dx")),
            inner.clone().prop_map(|e| format!("∫_0^1({e}) dx")),
            inner.prop_map(|e| format!("lim_{{x->0}}({e})")),
        ]
    })
}

proptest! {
    #[test]
    fn preprocess_is_idempotent(input in "\\PC{0,40}") {
        let once = preprocess(&input);
        prop_assert_eq!(preprocess(&once), once);
    }

    #[test]
    fn preprocess_keeps_length_reasonable(input in "\\PC{0,40}") {
        // each char can trigger at most one insertion
        prop_assert!(preprocess(&input).chars().count() <= 2 * input.chars().count());
    }

    /// Every supported-vocabulary input of nesting depth <= 3 terminates
    /// within the default budget: the call returns Ok or a clean error,
    /// never hangs or panics.
    #[test]
    fn bounded_nesting_terminates(input in notation_strategy()) {
        let _ = evaluate(&input);
    }

    /// Whenever notation parses, its canonical form is free of glyphs.
    #[test]
    fn canonical_form_has_no_glyphs(input in notation_strategy()) {
        if let Ok(node) = calc_notation::parser::parse(&preprocess(&input)) {
            let canonical = node.canonical();
            for glyph in ["∫", "∂", "²", "lim_{", "d/d"] {
                prop_assert!(!canonical.contains(glyph));
            }
        }
    }
}
