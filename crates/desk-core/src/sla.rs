//! SLA clock: deadline arithmetic and the compliance aggregate.
//!
//! Deadlines are plain additive offsets over microsecond timestamps.
//! There is no business-hour calendar and no timezone adjustment beyond
//! whatever the base instant already carries.

/// Microseconds in one hour.
pub const MICROS_PER_HOUR: i64 = 3_600 * 1_000_000;

/// Compute a deadline: `base + hours`.
#[must_use]
pub const fn target_timestamp(base_us: i64, hours: i64) -> i64 {
    base_us + hours * MICROS_PER_HOUR
}

/// Whether a resolution at `resolved_at_us` meets a deadline of
/// `target_us`. Non-strict: exactly on time counts as compliant.
#[must_use]
pub const fn is_compliant(resolved_at_us: i64, target_us: i64) -> bool {
    resolved_at_us <= target_us
}

/// One resolved/closed ticket's inputs to the compliance aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComplianceCase {
    /// The ticket's resolution deadline.
    pub target_us: i64,
    /// The instant of the ticket's *first* transition to `resolved`.
    ///
    /// First, not latest: a ticket that was reopened and re-resolved is
    /// judged by the originally promised resolution, not a retried one.
    /// `None` when no resolution event exists in the trail; such a
    /// ticket stays in the denominator and never counts as compliant.
    pub first_resolved_at_us: Option<i64>,
}

/// Percentage of cases whose first resolution met its deadline.
///
/// Zero cases is vacuous success: 100.0, never a division by zero.
#[must_use]
pub fn compliance_percentage(cases: &[ComplianceCase]) -> f64 {
    if cases.is_empty() {
        return 100.0;
    }

    let compliant = cases
        .iter()
        .filter(|case| {
            case.first_resolved_at_us
                .is_some_and(|at| is_compliant(at, case.target_us))
        })
        .count();

    #[allow(clippy::cast_precision_loss)]
    let pct = (compliant as f64 / cases.len() as f64) * 100.0;
    pct
}

#[cfg(test)]
mod tests {
    use super::{ComplianceCase, MICROS_PER_HOUR, compliance_percentage, is_compliant,
                target_timestamp};

    #[test]
    fn target_is_additive() {
        // 2024-01-01T00:00:00Z plus 8 hours.
        let base = 1_704_067_200_000_000;
        assert_eq!(
            target_timestamp(base, 8),
            base + 8 * MICROS_PER_HOUR,
        );
        assert_eq!(target_timestamp(base, 0), base);
    }

    #[test]
    fn boundary_is_inclusive() {
        let target = 5_000_000;
        assert!(is_compliant(target, target));
        assert!(is_compliant(target - 1, target));
        assert!(!is_compliant(target + 1_000_000, target));
    }

    #[test]
    fn zero_cases_is_vacuous_success() {
        assert!((compliance_percentage(&[]) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn mixed_cases_average_out() {
        let cases = [
            ComplianceCase {
                target_us: 100,
                first_resolved_at_us: Some(90),
            },
            ComplianceCase {
                target_us: 100,
                first_resolved_at_us: Some(200),
            },
        ];
        assert!((compliance_percentage(&cases) - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_resolution_event_counts_against() {
        let cases = [ComplianceCase {
            target_us: 100,
            first_resolved_at_us: None,
        }];
        assert!((compliance_percentage(&cases) - 0.0).abs() < f64::EPSILON);
    }
}
