/// Result of processing one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<I, T> {
    Success { item: I, value: T },
    Failure { item: I, error: String },
}

impl<I, T> Outcome<I, T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn item(&self) -> &I {
        match self {
            Outcome::Success { item, .. } | Outcome::Failure { item, .. } => item,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Success { value, .. } => Some(value),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::Failure { error, .. } => Some(error),
        }
    }
}

/// Counts and error lines aggregated from a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// `"<label>: <error>"`, in submission order.
    pub errors: Vec<String>,
}

impl BatchSummary {
    pub fn from_outcomes<I, T, L>(outcomes: &[Outcome<I, T>], label: L) -> Self
    where
        L: Fn(&I) -> String,
    {
        outcomes
            .iter()
            .fold(BatchSummary::default(), |mut summary, outcome| {
                match outcome {
                    Outcome::Success { .. } => summary.succeeded += 1,
                    Outcome::Failure { item, error } => {
                        summary.failed += 1;
                        summary.errors.push(format!("{}: {}", label(item), error));
                    }
                }
                summary
            })
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed == 0
    }

    /// Process exit status: 0 when every item succeeded, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_complete_success() { 0 } else { 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_and_labels() {
        let outcomes: Vec<Outcome<&str, ()>> = vec![
            Outcome::Success { item: "a.md", value: () },
            Outcome::Failure {
                item: "b.md",
                error: "HTTP 500".into(),
            },
            Outcome::Success { item: "c.md", value: () },
        ];

        let summary = BatchSummary::from_outcomes(&outcomes, |k| k.to_string());
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.errors, vec!["b.md: HTTP 500".to_string()]);
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn test_empty_summary_is_success() {
        let summary = BatchSummary::from_outcomes::<u8, (), _>(&[], |n| n.to_string());
        assert!(summary.is_complete_success());
        assert_eq!(summary.exit_code(), 0);
    }
}
