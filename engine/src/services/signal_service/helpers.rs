// Risk-management arithmetic for signal sections.
use shared::models::Direction;

/// Targets sit a fixed 2% away from entry, independent of the stop-loss distance.
pub const TARGET_MOVE_PCT: f64 = 2.0;

/// Below entry for a buy, above entry for a sell.
pub fn calculate_stop_loss(entry_price: f64, stop_loss_pct: f64, direction: Direction) -> f64 {
    match direction {
        Direction::Buy => entry_price * (1.0 - stop_loss_pct / 100.0),
        Direction::Sell => entry_price * (1.0 + stop_loss_pct / 100.0),
    }
}

pub fn calculate_target_price(entry_price: f64, direction: Direction) -> f64 {
    match direction {
        Direction::Buy => entry_price * (1.0 + TARGET_MOVE_PCT / 100.0),
        Direction::Sell => entry_price * (1.0 - TARGET_MOVE_PCT / 100.0),
    }
}

/// `None` when entry and stop loss coincide.
pub fn calculate_risk_to_reward(entry_price: f64, stop_loss: f64, target_price: f64) -> Option<f64> {
    let risk = entry_price - stop_loss;
    let reward = target_price - entry_price;
    if risk == 0.0 {
        None
    } else {
        Some(reward / risk)
    }
}

pub fn calculate_trade_size(total_balance: f64, risk_percentage: f64) -> f64 {
    total_balance * risk_percentage / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_loss_sides() {
        assert!((calculate_stop_loss(100.0, 2.0, Direction::Buy) - 98.0).abs() < 1e-9);
        assert!((calculate_stop_loss(100.0, 2.0, Direction::Sell) - 102.0).abs() < 1e-9);
    }

    #[test]
    fn test_target_price_sides() {
        assert!((calculate_target_price(100.0, Direction::Buy) - 102.0).abs() < 1e-9);
        assert!((calculate_target_price(100.0, Direction::Sell) - 98.0).abs() < 1e-9);
    }

    #[test]
    fn test_risk_to_reward() {
        let ratio = calculate_risk_to_reward(100.0, 99.0, 102.0).unwrap();
        assert!((ratio - 2.0).abs() < 1e-9);
        // sell side: negative reward over negative risk
        let ratio = calculate_risk_to_reward(100.0, 101.0, 98.0).unwrap();
        assert!((ratio - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_risk_has_no_ratio() {
        assert_eq!(calculate_risk_to_reward(100.0, 100.0, 102.0), None);
    }

    #[test]
    fn test_trade_size() {
        assert_eq!(calculate_trade_size(10_000.0, 2.0), 200.0);
    }
}
