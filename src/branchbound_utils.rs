use std::time::{SystemTime, UNIX_EPOCH};

/// Nodes whose bound is within this of the incumbent cannot improve on it
pub const PRUNE_TOLERANCE: f64 = 1E-9;

/// Wall clock time in seconds
pub fn get_current_time() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |d| d.as_secs_f64())
}

/// Relative gap between the incumbent and the lower bound in percent
pub fn relative_gap(upper_bound: f64, lower_bound: f64) -> f64 {
    if !upper_bound.is_finite() {
        return 100.0;
    }
    let gap = 100.0 * (upper_bound - lower_bound) / (upper_bound.abs() + 1E-5);
    gap.max(0.0)
}

#[cfg(test)]
mod tests {
    use crate::branchbound_utils::{get_current_time, relative_gap};

    #[test]
    fn clock_moves_forward() {
        let t0 = get_current_time();
        let t1 = get_current_time();
        assert!(t0 > 0.0);
        assert!(t1 >= t0);
    }

    #[test]
    fn gap() {
        assert_eq!(relative_gap(f64::INFINITY, 3.0), 100.0);
        assert_eq!(relative_gap(8.0, 9.0), 0.0);
        assert!((relative_gap(8.0, 6.0) - 25.0).abs() < 1E-3);
    }
}
