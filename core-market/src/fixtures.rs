//! Top movers shown in the market overview.
//!
//! The broker quotes endpoint has no movers screen, so the overview carries a
//! fixed list.

use crate::types::Mover;

pub fn top_gainers() -> Vec<Mover> {
    vec![
        Mover::new("RELIANCE", 2.45),
        Mover::new("HDFCBANK", 1.78),
        Mover::new("TCS", 1.56),
        Mover::new("INFY", 1.23),
        Mover::new("ICICIBANK", 0.95),
    ]
}

pub fn top_losers() -> Vec<Mover> {
    vec![
        Mover::new("TATASTEEL", -2.12),
        Mover::new("INDUSINDBK", -1.89),
        Mover::new("AXISBANK", -1.67),
        Mover::new("SUNPHARMA", -1.45),
        Mover::new("NESTLEIND", -1.23),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movers_are_sorted_by_magnitude() {
        let gainers = top_gainers();
        let losers = top_losers();

        assert_eq!(gainers.len(), 5);
        assert_eq!(losers.len(), 5);
        assert!(gainers.windows(2).all(|w| w[0].change >= w[1].change));
        assert!(losers.windows(2).all(|w| w[0].change <= w[1].change));
        assert!(losers.iter().all(|m| m.change < 0.0));
    }
}
