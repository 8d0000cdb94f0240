//! Market analysis: pair a matched game's posted prices against the
//! reference event's fair prices and emit EV per selection.
//!
//! Full-game and first-half data are analyzed independently; a selection is
//! never paired across periods. All pairing happens in reference
//! orientation — a flipped match swaps the secondary sides once up front.
//! Fair prices must already be enriched; EV against vig-inclusive reference
//! prices is never computed here because only `nvp_*` slots are read.

use crate::engine::lines::{format_line, lines_equal, normalize_line, MarketKind};
use crate::engine::matcher::Orientation;
use crate::engine::odds;
use crate::error::AnalyzeError;
use crate::feed::types::{
    FairPrice, PeriodMarkets, ReferenceEvent, PERIOD_FIRST_HALF, PERIOD_FULL_GAME,
};
use crate::scrape::{MarketPrices, OverUnder, SecondaryGame};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Selection {
    Home,
    Away,
    Draw,
    Over,
    Under,
}

/// One priced edge: a secondary-book selection against its fair price.
#[derive(Debug, Clone, Serialize)]
pub struct EvOpportunity {
    pub market: String,
    pub period: u8,
    pub selection: Selection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<f64>,
    pub reference_fair_decimal: f64,
    pub reference_fair_american: i32,
    pub secondary_american: i32,
    /// EV as a ratio; positive means the posted price beats fair.
    pub ev: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_limit: Option<f64>,
    pub home_team: String,
    pub away_team: String,
    pub bet: String,
}

/// Analyze one matched pair. The event must be enriched. Errors only when
/// the secondary game carries first-half data but the reference event has
/// no usable periods at all.
pub fn analyze_pair(
    event: &ReferenceEvent,
    game: &SecondaryGame,
    orientation: Orientation,
) -> Result<Vec<EvOpportunity>, AnalyzeError> {
    let has_full = event.periods.contains_key(&PERIOD_FULL_GAME);
    let has_half = event.periods.contains_key(&PERIOD_FIRST_HALF);
    if game.first_half.is_some() && !has_full && !has_half {
        return Err(AnalyzeError::PeriodMismatch {
            event_id: event.event_id.clone(),
            game: game.game_id(),
        });
    }

    let orient = |prices: &MarketPrices| match orientation {
        Orientation::Direct => prices.clone(),
        Orientation::Flipped => prices.swapped(),
    };

    let mut rows = Vec::new();
    let ctx = Context {
        home_team: &event.home_team,
        away_team: &event.away_team,
    };

    if let Some(markets) = event.periods.get(&PERIOD_FULL_GAME) {
        analyze_period(
            &orient(&game.full_game),
            markets,
            PERIOD_FULL_GAME,
            "",
            &ctx,
            &mut rows,
        );
    }

    if let Some(first_half) = &game.first_half {
        match event.periods.get(&PERIOD_FIRST_HALF) {
            Some(markets) => analyze_period(
                &orient(first_half),
                markets,
                PERIOD_FIRST_HALF,
                "1H ",
                &ctx,
                &mut rows,
            ),
            None => tracing::warn!(
                event_id = event.event_id.as_str(),
                "first-half prices posted but reference has no first-half period; rows suppressed"
            ),
        }
    }

    Ok(rows)
}

struct Context<'a> {
    home_team: &'a str,
    away_team: &'a str,
}

fn analyze_period(
    prices: &MarketPrices,
    markets: &PeriodMarkets,
    period: u8,
    prefix: &str,
    ctx: &Context<'_>,
    rows: &mut Vec<EvOpportunity>,
) {
    analyze_moneyline(prices, markets, period, prefix, ctx, rows);
    analyze_spreads(prices, markets, period, prefix, ctx, rows);
    analyze_total_options(prices, markets, period, prefix, ctx, rows);
    analyze_aggregate_total(prices, markets, period, prefix, ctx, rows);
}

/// EV of a posted American price against a fair price.
fn edge(secondary: i32, fair: &FairPrice) -> Option<f64> {
    let bet_decimal = odds::american_to_decimal(secondary)?;
    odds::expected_value(bet_decimal, fair.decimal)
}

#[allow(clippy::too_many_arguments)]
fn row(
    market: String,
    period: u8,
    selection: Selection,
    line: Option<f64>,
    fair: &FairPrice,
    secondary: i32,
    ev: f64,
    max_limit: Option<f64>,
    ctx: &Context<'_>,
    bet: String,
) -> EvOpportunity {
    EvOpportunity {
        market,
        period,
        selection,
        line,
        reference_fair_decimal: fair.decimal,
        reference_fair_american: fair.american,
        secondary_american: secondary,
        ev,
        max_limit,
        home_team: ctx.home_team.to_string(),
        away_team: ctx.away_team.to_string(),
        bet,
    }
}

fn analyze_moneyline(
    prices: &MarketPrices,
    markets: &PeriodMarkets,
    period: u8,
    prefix: &str,
    ctx: &Context<'_>,
    rows: &mut Vec<EvOpportunity>,
) {
    let Some(ml) = &markets.money_line else { return };
    let limit = ml
        .max
        .or_else(|| markets.meta.as_ref().and_then(|m| m.max_money_line));

    let sides = [
        (Selection::Home, prices.home_moneyline_american, ml.nvp_home, ctx.home_team),
        (Selection::Away, prices.away_moneyline_american, ml.nvp_away, ctx.away_team),
        (Selection::Draw, prices.draw_moneyline_american, ml.nvp_draw, "Draw"),
    ];
    for (selection, posted, fair, team) in sides {
        let (Some(posted), Some(fair)) = (posted, fair) else {
            continue;
        };
        let Some(ev) = edge(posted, &fair) else { continue };
        rows.push(row(
            format!("{}Moneyline", prefix),
            period,
            selection,
            None,
            &fair,
            posted,
            ev,
            limit,
            ctx,
            format!("ML - {}", team),
        ));
    }
}

fn analyze_spreads(
    prices: &MarketPrices,
    markets: &PeriodMarkets,
    period: u8,
    prefix: &str,
    ctx: &Context<'_>,
    rows: &mut Vec<EvOpportunity>,
) {
    // Home side: the posted line must equal the reference handicap; away
    // side: its negative. The first reference line inside tolerance wins.
    for option in &prices.home_spreads {
        let Some(posted) = option.odds else { continue };
        let Some(bet_line) = normalize_line(&option.line, MarketKind::Spread) else {
            continue;
        };
        for spread in markets.spreads.values() {
            if !lines_equal(bet_line, spread.hdp) {
                continue;
            }
            let Some(fair) = spread.nvp_home else { continue };
            let Some(ev) = edge(posted, &fair) else { continue };
            let limit = spread
                .max
                .or_else(|| markets.meta.as_ref().and_then(|m| m.max_spread));
            rows.push(row(
                format!("{}Spread", prefix),
                period,
                Selection::Home,
                Some(spread.hdp),
                &fair,
                posted,
                ev,
                limit,
                ctx,
                format!("{} {}", ctx.home_team, format_line(spread.hdp, MarketKind::Spread)),
            ));
            break;
        }
    }

    for option in &prices.away_spreads {
        let Some(posted) = option.odds else { continue };
        let Some(bet_line) = normalize_line(&option.line, MarketKind::Spread) else {
            continue;
        };
        for spread in markets.spreads.values() {
            if !lines_equal(bet_line, -spread.hdp) {
                continue;
            }
            let Some(fair) = spread.nvp_away else { continue };
            let Some(ev) = edge(posted, &fair) else { continue };
            let limit = spread
                .max
                .or_else(|| markets.meta.as_ref().and_then(|m| m.max_spread));
            rows.push(row(
                format!("{}Spread", prefix),
                period,
                Selection::Away,
                Some(-spread.hdp),
                &fair,
                posted,
                ev,
                limit,
                ctx,
                format!("{} {}", ctx.away_team, format_line(-spread.hdp, MarketKind::Spread)),
            ));
            break;
        }
    }
}

/// Per-side total options, when the book posts each side separately.
fn analyze_total_options(
    prices: &MarketPrices,
    markets: &PeriodMarkets,
    period: u8,
    prefix: &str,
    ctx: &Context<'_>,
    rows: &mut Vec<EvOpportunity>,
) {
    for option in &prices.totals {
        let Some(posted) = option.odds else { continue };
        let Some(bet_line) = normalize_line(&option.line, MarketKind::Total) else {
            continue;
        };
        for total in markets.totals.values() {
            let Some(ref_line) = normalize_line(&total.points, MarketKind::Total) else {
                continue;
            };
            if !lines_equal(bet_line, ref_line) {
                continue;
            }
            let (selection, fair) = match option.side {
                OverUnder::Over => (Selection::Over, total.nvp_over),
                OverUnder::Under => (Selection::Under, total.nvp_under),
            };
            let Some(fair) = fair else { continue };
            let Some(ev) = edge(posted, &fair) else { continue };
            let limit = total
                .max
                .or_else(|| markets.meta.as_ref().and_then(|m| m.max_total));
            let word = match selection {
                Selection::Over => "Over",
                _ => "Under",
            };
            rows.push(row(
                format!("{}Total", prefix),
                period,
                selection,
                Some(ref_line),
                &fair,
                posted,
                ev,
                limit,
                ctx,
                format!("{} {}", word, format_line(ref_line, MarketKind::Total)),
            ));
            break;
        }
    }
}

/// The aggregate game total: one posted line with over and under prices.
/// Emits at most one over and one under row; when several reference lines
/// tie within tolerance the highest-EV candidate is kept.
fn analyze_aggregate_total(
    prices: &MarketPrices,
    markets: &PeriodMarkets,
    period: u8,
    prefix: &str,
    ctx: &Context<'_>,
    rows: &mut Vec<EvOpportunity>,
) {
    let Some(raw_line) = &prices.game_total_line else {
        return;
    };
    let Some(bet_line) = normalize_line(raw_line, MarketKind::Total) else {
        return;
    };

    let mut best_over: Option<EvOpportunity> = None;
    let mut best_under: Option<EvOpportunity> = None;

    for total in markets.totals.values() {
        let Some(ref_line) = normalize_line(&total.points, MarketKind::Total) else {
            continue;
        };
        if !lines_equal(bet_line, ref_line) {
            continue;
        }
        let limit = total
            .max
            .or_else(|| markets.meta.as_ref().and_then(|m| m.max_total));

        if let (Some(posted), Some(fair)) = (prices.game_total_over_odds, total.nvp_over) {
            if let Some(ev) = edge(posted, &fair) {
                if best_over.as_ref().is_none_or(|b| ev > b.ev) {
                    best_over = Some(row(
                        format!("{}Total", prefix),
                        period,
                        Selection::Over,
                        Some(ref_line),
                        &fair,
                        posted,
                        ev,
                        limit,
                        ctx,
                        format!("Over {}", format_line(ref_line, MarketKind::Total)),
                    ));
                }
            }
        }
        if let (Some(posted), Some(fair)) = (prices.game_total_under_odds, total.nvp_under) {
            if let Some(ev) = edge(posted, &fair) {
                if best_under.as_ref().is_none_or(|b| ev > b.ev) {
                    best_under = Some(row(
                        format!("{}Total", prefix),
                        period,
                        Selection::Under,
                        Some(ref_line),
                        &fair,
                        posted,
                        ev,
                        limit,
                        ctx,
                        format!("Under {}", format_line(ref_line, MarketKind::Total)),
                    ));
                }
            }
        }
    }

    rows.extend(best_over);
    rows.extend(best_under);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::enrich::enrich_event;

    fn enriched_event(json: serde_json::Value) -> ReferenceEvent {
        let mut event: ReferenceEvent = serde_json::from_value(json).unwrap();
        enrich_event(&mut event);
        event
    }

    fn game_json(json: serde_json::Value) -> SecondaryGame {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_moneyline_rows_and_signs() {
        let event = enriched_event(serde_json::json!({
            "event_id": "1",
            "home_team": "Pirates",
            "away_team": "Cubs",
            "periods": {
                "num_0": { "money_line": { "home": 1.87, "away": 1.95 } }
            }
        }));
        let game = game_json(serde_json::json!({
            "home_team_raw": "Pittsburgh Pirates",
            "away_team_raw": "Chicago Cubs",
            "full_game": {
                "home_moneyline_american": "+100",
                "away_moneyline_american": "-110"
            }
        }));

        let rows = analyze_pair(&event, &game, Orientation::Direct).unwrap();
        assert_eq!(rows.len(), 2);

        let home = rows.iter().find(|r| r.selection == Selection::Home).unwrap();
        let away = rows.iter().find(|r| r.selection == Selection::Away).unwrap();
        assert_eq!(home.market, "Moneyline");
        assert_eq!(home.bet, "ML - Pirates");
        // +100 beats the fair home price; -110 does not beat the fair away.
        assert!(home.ev > 0.0 && home.ev < 0.05);
        assert!(away.ev < 0.0);
        // Fair prices form a proper distribution.
        let sum = 1.0 / home.reference_fair_decimal + 1.0 / away.reference_fair_decimal;
        assert!((sum - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_spread_pairing_home_and_away() {
        let event = enriched_event(serde_json::json!({
            "event_id": "2",
            "home_team": "Braves",
            "away_team": "Mets",
            "periods": {
                "0": {
                    "spreads": { "-1.5": { "hdp": -1.5, "home": 2.70, "away": 1.48, "max": 500.0 } }
                }
            }
        }));
        let game = game_json(serde_json::json!({
            "home_team_raw": "Atlanta Braves",
            "away_team_raw": "New York Mets",
            "full_game": {
                "home_spreads": [{"line": "-1.5", "odds": "+170"}],
                "away_spreads": [{"line": "+1.5", "odds": "-190"}]
            }
        }));

        let rows = analyze_pair(&event, &game, Orientation::Direct).unwrap();
        assert_eq!(rows.len(), 2);

        let home = rows.iter().find(|r| r.selection == Selection::Home).unwrap();
        assert_eq!(home.line, Some(-1.5));
        assert_eq!(home.bet, "Braves -1.5");
        assert_eq!(home.max_limit, Some(500.0));
        // Posted +170 equals the raw price, which sits below fair.
        assert!(home.ev < 0.0);

        let away = rows.iter().find(|r| r.selection == Selection::Away).unwrap();
        assert_eq!(away.line, Some(1.5));
        assert_eq!(away.bet, "Mets +1.5");
    }

    #[test]
    fn test_spread_line_identity_enforced() {
        // An away spread at +2.5 must not pair a -1.5 reference handicap.
        let event = enriched_event(serde_json::json!({
            "event_id": "3",
            "home_team": "A",
            "away_team": "B",
            "periods": {
                "0": { "spreads": { "-1.5": { "hdp": -1.5, "home": 1.91, "away": 1.91 } } }
            }
        }));
        let game = game_json(serde_json::json!({
            "home_team_raw": "A",
            "away_team_raw": "B",
            "full_game": { "away_spreads": [{"line": "+2.5", "odds": "-110"}] }
        }));
        let rows = analyze_pair(&event, &game, Orientation::Direct).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_split_line_pairs_quarter_step() {
        let event = enriched_event(serde_json::json!({
            "event_id": "4",
            "home_team": "A",
            "away_team": "B",
            "periods": {
                "0": {
                    "spreads": {
                        "1.25": { "hdp": 1.25, "home": 1.90, "away": 1.92 },
                        "1.0":  { "hdp": 1.0,  "home": 2.05, "away": 1.78 },
                        "1.5":  { "hdp": 1.5,  "home": 1.80, "away": 2.02 }
                    }
                }
            }
        }));
        let game = game_json(serde_json::json!({
            "home_team_raw": "A",
            "away_team_raw": "B",
            "full_game": { "home_spreads": [{"line": "+1,+1.5", "odds": "-110"}] }
        }));
        let rows = analyze_pair(&event, &game, Orientation::Direct).unwrap();
        // The split line parses to +1.25 and pairs only the 1.25 handicap.
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].line, Some(1.25));
    }

    #[test]
    fn test_split_line_unpaired_without_quarter_step() {
        let event = enriched_event(serde_json::json!({
            "event_id": "5",
            "home_team": "A",
            "away_team": "B",
            "periods": {
                "0": {
                    "spreads": {
                        "1.0": { "hdp": 1.0, "home": 2.05, "away": 1.78 },
                        "1.5": { "hdp": 1.5, "home": 1.80, "away": 2.02 }
                    }
                }
            }
        }));
        let game = game_json(serde_json::json!({
            "home_team_raw": "A",
            "away_team_raw": "B",
            "full_game": { "home_spreads": [{"line": "+1,+1.5", "odds": "-110"}] }
        }));
        let rows = analyze_pair(&event, &game, Orientation::Direct).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_aggregate_total_single_over_under() {
        let event = enriched_event(serde_json::json!({
            "event_id": "6",
            "home_team": "A",
            "away_team": "B",
            "periods": {
                "0": {
                    "totals": {
                        "8.5": { "points": 8.5, "over": 1.87, "under": 1.95 }
                    }
                }
            }
        }));
        let game = game_json(serde_json::json!({
            "home_team_raw": "A",
            "away_team_raw": "B",
            "full_game": {
                "game_total_line": "8.5",
                "game_total_over_odds": "+105",
                "game_total_under_odds": "-115"
            }
        }));
        let rows = analyze_pair(&event, &game, Orientation::Direct).unwrap();
        assert_eq!(rows.len(), 2);
        let over = rows.iter().find(|r| r.selection == Selection::Over).unwrap();
        assert_eq!(over.bet, "Over 8.5");
        assert_eq!(over.line, Some(8.5));
    }

    #[test]
    fn test_flipped_orientation_swaps_sides() {
        // The secondary "home" is the reference away team; its price must
        // land on the away fair price.
        let event = enriched_event(serde_json::json!({
            "event_id": "7",
            "home_team": "Juventus",
            "away_team": "Internazionale",
            "periods": {
                "num_0": { "money_line": { "home": 2.4, "draw": 3.3, "away": 3.1 } }
            }
        }));
        let game = game_json(serde_json::json!({
            "home_team_raw": "Inter Milan",
            "away_team_raw": "Juventus",
            "full_game": {
                "home_moneyline_american": "+250",
                "draw_moneyline_american": "+230"
            }
        }));
        let rows = analyze_pair(&event, &game, Orientation::Flipped).unwrap();
        let away = rows.iter().find(|r| r.selection == Selection::Away).unwrap();
        assert_eq!(away.secondary_american, 250);
        assert_eq!(away.bet, "ML - Internazionale");
        assert!(rows.iter().any(|r| r.selection == Selection::Draw));
        assert!(!rows.iter().any(|r| r.selection == Selection::Home));
    }

    #[test]
    fn test_first_half_suppressed_without_reference_period() {
        let event = enriched_event(serde_json::json!({
            "event_id": "8",
            "home_team": "A",
            "away_team": "B",
            "periods": {
                "0": { "totals": { "8.5": { "points": 8.5, "over": 1.91, "under": 1.91 } } }
            }
        }));
        let game = game_json(serde_json::json!({
            "home_team_raw": "A",
            "away_team_raw": "B",
            "full_game": {
                "game_total_line": "8.5",
                "game_total_over_odds": "-105",
                "game_total_under_odds": "-115"
            },
            "first_half": {
                "game_total_line": "4.5",
                "game_total_over_odds": "-110",
                "game_total_under_odds": "-110"
            }
        }));
        let rows = analyze_pair(&event, &game, Orientation::Direct).unwrap();
        // Full-game rows only; nothing drawn from the missing 1H period.
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.period == PERIOD_FULL_GAME));
        assert!(rows.iter().all(|r| !r.market.starts_with("1H")));
    }

    #[test]
    fn test_period_mismatch_aborts() {
        let event = enriched_event(serde_json::json!({
            "event_id": "9",
            "home_team": "A",
            "away_team": "B"
        }));
        let game = game_json(serde_json::json!({
            "home_team_raw": "A",
            "away_team_raw": "B",
            "first_half": { "home_moneyline_american": "-110" }
        }));
        let err = analyze_pair(&event, &game, Orientation::Direct).unwrap_err();
        assert!(matches!(err, AnalyzeError::PeriodMismatch { .. }));
    }

    #[test]
    fn test_first_half_rows_carry_prefix_and_period() {
        let event = enriched_event(serde_json::json!({
            "event_id": "10",
            "home_team": "A",
            "away_team": "B",
            "periods": {
                "num_0": { "money_line": { "home": 1.91, "away": 1.91 } },
                "num_1": { "money_line": { "home": 1.95, "away": 1.87 } }
            }
        }));
        let game = game_json(serde_json::json!({
            "home_team_raw": "A",
            "away_team_raw": "B",
            "full_game": { "home_moneyline_american": "-105" },
            "first_half": { "home_moneyline_american": "+110" }
        }));
        let rows = analyze_pair(&event, &game, Orientation::Direct).unwrap();
        let half: Vec<_> = rows.iter().filter(|r| r.period == PERIOD_FIRST_HALF).collect();
        assert_eq!(half.len(), 1);
        assert_eq!(half[0].market, "1H Moneyline");
        let full: Vec<_> = rows.iter().filter(|r| r.period == PERIOD_FULL_GAME).collect();
        assert_eq!(full.len(), 1);
        assert_eq!(full[0].market, "Moneyline");
    }

    #[test]
    fn test_per_side_total_options() {
        let event = enriched_event(serde_json::json!({
            "event_id": "11",
            "home_team": "A",
            "away_team": "B",
            "periods": {
                "num_1": {
                    "totals": { "4.5": { "points": "4.5", "over": 1.95, "under": 1.87 } }
                },
                "num_0": {}
            }
        }));
        let game = game_json(serde_json::json!({
            "home_team_raw": "A",
            "away_team_raw": "B",
            "first_half": {
                "totals": [
                    {"line": "4.5", "odds": "+100", "side": "o"},
                    {"line": "4.5", "odds": "-120", "side": "u"}
                ]
            }
        }));
        let rows = analyze_pair(&event, &game, Orientation::Direct).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.market == "1H Total"));
        assert!(rows.iter().any(|r| r.selection == Selection::Over));
        assert!(rows.iter().any(|r| r.selection == Selection::Under));
    }

    #[test]
    fn test_limit_falls_back_to_period_meta() {
        let event = enriched_event(serde_json::json!({
            "event_id": "12",
            "home_team": "A",
            "away_team": "B",
            "periods": {
                "0": {
                    "money_line": { "home": 1.91, "away": 1.91 },
                    "meta": { "max_money_line": 3000.0 }
                }
            }
        }));
        let game = game_json(serde_json::json!({
            "home_team_raw": "A",
            "away_team_raw": "B",
            "full_game": { "home_moneyline_american": "+100" }
        }));
        let rows = analyze_pair(&event, &game, Orientation::Direct).unwrap();
        assert_eq!(rows[0].max_limit, Some(3000.0));
    }
}
