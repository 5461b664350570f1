//! Ordered, human-readable derivation trace.

/// One recorded resolution step.
#[derive(Debug, Clone)]
pub struct Step {
    pub rule: &'static str,
    pub description: String,
}

/// Steps in application order, rendered at the end of an evaluation.
#[derive(Debug, Default)]
pub struct Trace {
    steps: Vec<Step>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: &'static str, description: String) {
        tracing::debug!(rule, %description, "step");
        self.steps.push(Step { rule, description });
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn into_lines(self) -> Vec<String> {
        self.steps.into_iter().map(|s| s.description).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_keep_order() {
        let mut trace = Trace::new();
        trace.push("first", "one".to_string());
        trace.push("second", "two".to_string());
        assert_eq!(trace.into_lines(), vec!["one", "two"]);
    }
}
