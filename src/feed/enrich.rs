//! Fair-price enrichment.
//!
//! One pass over a reference event applies the no-vig solver independently
//! to the moneyline vector, each spread pair, and each total pair, filling
//! the `nvp_*` slots with `FairPrice` values. Runs before matching so the
//! analyzer never sees vig-inclusive reference prices.

use super::types::{FairPrice, MoneylineMarket, ReferenceEvent, SpreadMarket, TotalMarket};
use crate::engine::odds;

/// Build a `FairPrice` from a fair decimal, if it converts to American form.
fn fair_price(decimal: Option<f64>) -> Option<FairPrice> {
    let decimal = decimal?;
    let american = odds::decimal_to_american(decimal)?;
    Some(FairPrice { decimal, american })
}

fn enrich_money_line(ml: &mut MoneylineMarket) {
    let fair = odds::no_vig(&[ml.home, ml.draw, ml.away]);
    ml.nvp_home = fair_price(fair[0]);
    ml.nvp_draw = fair_price(fair[1]);
    ml.nvp_away = fair_price(fair[2]);
}

fn enrich_spread(spread: &mut SpreadMarket) {
    let fair = odds::no_vig(&[spread.home, spread.away]);
    spread.nvp_home = fair_price(fair[0]);
    spread.nvp_away = fair_price(fair[1]);
}

fn enrich_total(total: &mut TotalMarket) {
    let fair = odds::no_vig(&[total.over, total.under]);
    total.nvp_over = fair_price(fair[0]);
    total.nvp_under = fair_price(fair[1]);
}

/// Fill every market's fair prices in place.
pub fn enrich_event(event: &mut ReferenceEvent) {
    for markets in event.periods.values_mut() {
        if let Some(ml) = markets.money_line.as_mut() {
            enrich_money_line(ml);
        }
        for spread in markets.spreads.values_mut() {
            enrich_spread(spread);
        }
        for total in markets.totals.values_mut() {
            enrich_total(total);
        }
    }
}
