use crate::models::SettlementSnapshot;

/// Platform commission rate applied when configuration provides none
pub const DEFAULT_COMMISSION_RATE: f64 = 0.09;

/// Split an order subtotal between the restaurant and the platform.
///
/// Pure and side-effect free; safe to call unboundedly in parallel. The
/// resulting snapshot is stored on the order and never recomputed.
pub fn split(subtotal: f64, rate: f64) -> SettlementSnapshot {
    let commission_amount = subtotal * rate;
    SettlementSnapshot {
        subtotal,
        commission_rate: rate,
        commission_amount,
        restaurant_earning: subtotal - commission_amount,
        platform_earning: commission_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn default_rate_scenario() {
        let snapshot = split(90.0, DEFAULT_COMMISSION_RATE);

        assert!((snapshot.commission_amount - 8.10).abs() < EPS);
        assert!((snapshot.restaurant_earning - 81.90).abs() < EPS);
        assert!((snapshot.platform_earning - 8.10).abs() < EPS);
    }

    #[test]
    fn split_conserves_the_subtotal() {
        for subtotal in [0.0, 0.01, 12.34, 90.0, 250.75, 100_000.0] {
            for rate in [0.0, 0.05, 0.09, 0.25, 0.5, 1.0] {
                let snapshot = split(subtotal, rate);
                assert!(
                    (snapshot.commission_amount + snapshot.restaurant_earning - subtotal).abs()
                        < EPS,
                    "split must conserve subtotal for {subtotal} at {rate}"
                );
                assert!((snapshot.commission_amount - subtotal * rate).abs() < EPS);
                assert_eq!(snapshot.platform_earning, snapshot.commission_amount);
            }
        }
    }
}
