//! Custom test assertions

use partition_writer::InsertSummary;

/// Assert two values are approximately equal (for floats)
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr) => {
        $crate::assert_approx_eq!($left, $right, 1e-6_f64)
    };
    ($left:expr, $right:expr, $epsilon:expr) => {
        let left_val: f64 = $left as f64;
        let right_val: f64 = $right as f64;
        let diff = (left_val - right_val).abs();
        assert!(
            diff < $epsilon,
            "assertion failed: `(left ~ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  \
             diff: `{:?}` (epsilon: `{:?}`)",
            left_val,
            right_val,
            diff,
            $epsilon
        );
    };
}

/// Assertions for InsertSummary
pub trait SummaryAssertions {
    /// Assert every input item is accounted for exactly once
    fn assert_accounted(&self);
}

impl SummaryAssertions for InsertSummary {
    fn assert_accounted(&self) {
        assert_eq!(
            self.succeeded + self.failed + self.cancelled,
            self.total_items as u64,
            "succeeded {} + failed {} + cancelled {} != total {}",
            self.succeeded,
            self.failed,
            self.cancelled,
            self.total_items
        );
        assert!(self.conflicted <= self.failed);
    }
}
