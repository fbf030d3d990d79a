//! Shared growth-curve primitives used throughout the spell catalogue.

/// Exponential growth with an optional threshold and diminishing-returns
/// knee. `base` must lie in `[1.01, 1.10]`.
pub fn exp_growth(base: f64, value: f64, threshold: f64, diminishing_returns: Option<f64>) -> f64 {
    debug_assert!((1.01..=1.10).contains(&base), "invalid base: {base}");
    let x = value - threshold;
    if x < 0.0 {
        (base + (base - 1.0) * 2.0).powf(x)
    } else {
        match diminishing_returns {
            None => base.powf(x),
            Some(dim) if x <= dim => base.powf(x),
            Some(dim) => {
                let beyond_dim = x - dim;
                let divisor = if base <= 1.02 {
                    5.0
                } else if base <= 1.03 {
                    4.0
                } else if base <= 1.05 {
                    3.0
                } else {
                    2.0
                };
                let additional = (beyond_dim.powf(1.0 / divisor) - 1.0).max(0.0);
                base.powf(dim) + additional
            }
        }
    }
}

/// Polynomial growth, zero below zero. `poly_growth(v, e, d) = 0 if v<0
/// else v^e/d`.
pub fn poly_growth(val: f64, exp: f64, div: f64) -> f64 {
    if val < 0.0 { 0.0 } else { val.powf(exp) / div }
}

/// Greatest `n` such that `sum_{i=1}^{n} i*base <= total`, computed by
/// iterative subtraction rather than a closed-form triangular-number
/// solve, to keep behavior exact at the boundary of floating-point
/// `total`.
pub fn fibonacci_div(total: f64, base: f64) -> u32 {
    let mut remaining = total;
    let mut rv = 0u32;
    loop {
        let cost = (rv as f64 + 1.0) * base;
        if cost > remaining {
            return rv;
        }
        remaining -= cost;
        rv += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exp_growth_below_threshold_is_steeper() {
        let at_threshold = exp_growth(1.03, 0.0, 0.0, None);
        let below = exp_growth(1.03, -1.0, 0.0, None);
        assert!(below < at_threshold);
    }

    #[test]
    fn exp_growth_respects_diminishing_returns() {
        let no_dim = exp_growth(1.03, 100.0, 0.0, None);
        let with_dim = exp_growth(1.03, 100.0, 0.0, Some(50.0));
        assert!(with_dim < no_dim);
    }

    #[test]
    fn poly_growth_is_zero_below_zero() {
        assert_eq!(poly_growth(-5.0, 1.5, 8.0), 0.0);
    }

    #[test]
    fn poly_growth_matches_formula() {
        let v = poly_growth(4.0, 2.0, 2.0);
        assert!((v - 8.0).abs() < 1e-9);
    }

    #[test]
    fn fibonacci_div_basic() {
        // base=10: costs are 10, 20, 30, ... total=35 -> 10+20=30 fits, 30 more doesn't
        assert_eq!(fibonacci_div(35.0, 10.0), 2);
        assert_eq!(fibonacci_div(0.0, 10.0), 0);
        assert_eq!(fibonacci_div(30.0, 10.0), 2);
        assert_eq!(fibonacci_div(5.0, 10.0), 0);
    }
}
