//! Odds arithmetic: American/decimal conversion, no-vig fair pricing via the
//! power method, and expected value of a bet price against a fair price.
//!
//! Absent odds are a value (`None`), never an error. Every function here is
//! pure; callers decide what a missing price means.

const NEWTON_TOLERANCE: f64 = 1e-4;
const NEWTON_MAX_ITERATIONS: usize = 100;
const DERIVATIVE_FLOOR: f64 = 1e-9;

/// Minimum decimal price that carries any information. Anything at or below
/// this is a zero-profit or malformed price and is treated as absent.
pub const MIN_DECIMAL: f64 = 1.0001;

/// Convert American odds to decimal odds.
/// Valid American odds have magnitude >= 100; everything else is absent.
pub fn american_to_decimal(american: i32) -> Option<f64> {
    if american.abs() < 100 {
        return None;
    }
    if american > 0 {
        Some(american as f64 / 100.0 + 1.0)
    } else {
        Some(100.0 / american.abs() as f64 + 1.0)
    }
}

/// Convert decimal odds to American odds. Absent for prices at or below 1.0001.
pub fn decimal_to_american(decimal: f64) -> Option<i32> {
    if !decimal.is_finite() || decimal <= MIN_DECIMAL {
        return None;
    }
    if decimal >= 2.0 {
        Some(((decimal - 1.0) * 100.0).round() as i32)
    } else {
        Some((-100.0 / (decimal - 1.0)).round() as i32)
    }
}

/// Parse American odds from book-formatted text: "-110", "+170", "EVEN".
/// Sub-three-digit magnitudes and non-numeric junk are absent.
pub fn parse_american(s: &str) -> Option<i32> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("even") {
        return Some(100);
    }
    let value: i32 = s.parse().ok()?;
    if value.abs() < 100 {
        return None;
    }
    Some(value)
}

/// Expected value of a bet priced at `bet_decimal` against a fair price of
/// `fair_decimal`: `bet/fair - 1`. Absent if either price is non-positive.
pub fn expected_value(bet_decimal: f64, fair_decimal: f64) -> Option<f64> {
    if bet_decimal <= 0.0 || fair_decimal <= 0.0 {
        return None;
    }
    Some(bet_decimal / fair_decimal - 1.0)
}

/// Remove the vig from a market's decimal odds using the power method.
///
/// Finds k such that the implied probabilities raised to k sum to 1, then
/// returns the fair decimal price at each valid index. Indices whose input
/// was absent or out of range stay absent. Markets with fewer than two valid
/// prices, or whose implied sum is already <= 1.0001, come back unchanged —
/// there is no vig to remove.
pub fn no_vig(odds: &[Option<f64>]) -> Vec<Option<f64>> {
    let valid: Vec<(usize, f64)> = odds
        .iter()
        .enumerate()
        .filter_map(|(i, o)| match o {
            Some(v) if v.is_finite() && *v > MIN_DECIMAL => Some((i, *v)),
            _ => None,
        })
        .collect();

    if valid.len() < 2 {
        // A one-sided market has no overround to strip.
        return odds.to_vec();
    }

    let implied: Vec<f64> = valid.iter().map(|(_, o)| 1.0 / o).collect();
    let implied_sum: f64 = implied.iter().sum();

    let mut result = vec![None; odds.len()];
    if implied_sum <= MIN_DECIMAL {
        // Already fair (or better); hand the inputs back.
        for (i, o) in &valid {
            result[*i] = Some(*o);
        }
        return result;
    }

    let fair_probs = adjust_power_probabilities(&implied);
    for ((i, _), p) in valid.iter().zip(fair_probs.iter()) {
        if *p > DERIVATIVE_FLOOR {
            result[*i] = Some(1.0 / p);
        }
    }
    result
}

/// Newton-iterate on f(k) = sum(p_i^k) - 1 to find the power that removes
/// the overround, then renormalize. Degenerate probabilities (<= 0 or >= 1)
/// fall back to proportional normalization.
fn adjust_power_probabilities(probs: &[f64]) -> Vec<f64> {
    if probs.iter().any(|p| *p <= 0.0 || *p >= 1.0) {
        return proportional(probs);
    }

    let mut k = 1.0_f64;
    for _ in 0..NEWTON_MAX_ITERATIONS {
        let powered: Vec<f64> = probs.iter().map(|p| p.powf(k)).collect();
        let sum: f64 = powered.iter().sum();
        if sum == 0.0 {
            break;
        }
        let overround = sum - 1.0;
        if overround.abs() < NEWTON_TOLERANCE {
            break;
        }
        let derivative: f64 = powered
            .iter()
            .zip(probs.iter())
            .map(|(pw, p)| pw * p.ln())
            .sum();
        if derivative.abs() < DERIVATIVE_FLOOR {
            break;
        }
        k -= overround / derivative;
    }

    let powered: Vec<f64> = probs.iter().map(|p| p.powf(k)).collect();
    let sum: f64 = powered.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        return proportional(probs);
    }
    powered.iter().map(|p| p / sum).collect()
}

fn proportional(probs: &[f64]) -> Vec<f64> {
    let sum: f64 = probs.iter().sum();
    if sum == 0.0 {
        return vec![0.0; probs.len()];
    }
    probs.iter().map(|p| p / sum).collect()
}
