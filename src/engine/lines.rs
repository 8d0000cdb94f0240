//! Market-line parsing: quarter/half-step handicap and total lines as the
//! book prints them, including "½" fractions, "pk" (pick'em), and split
//! Asian lines like "+1,+1.5" that average to a quarter step.
//!
//! The market kind is an explicit parameter. Spread lines are signed and a
//! pick is 0; total lines are non-negative.

/// Which parsing rules apply to a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketKind {
    Spread,
    Total,
}

/// Two lines agreeing within this are the same line.
pub const LINE_TOLERANCE: f64 = 0.01;

pub fn lines_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= LINE_TOLERANCE
}

/// Parse a raw line string into a numeric line.
///
/// Handles "½" as .5, "pk" as 0 (spreads only), split lines joined by a
/// comma or slash averaged to one value, and plain signed/unsigned numbers.
/// Returns `None` for anything unparseable, and for negative totals.
pub fn normalize_line(raw: &str, kind: MarketKind) -> Option<f64> {
    let cleaned: String = raw
        .replace('½', ".5")
        .replace('\u{a0}', "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let parts: Vec<&str> = cleaned.split([',', '/']).collect();
    let value = match parts.len() {
        1 => parse_component(parts[0], kind)?,
        2 => {
            let a = parse_component(parts[0], kind)?;
            let b = parse_component(parts[1], kind)?;
            (a + b) / 2.0
        }
        _ => return None,
    };

    if kind == MarketKind::Total && value < 0.0 {
        return None;
    }
    Some(value)
}

fn parse_component(s: &str, kind: MarketKind) -> Option<f64> {
    if s.eq_ignore_ascii_case("pk") {
        // A pick'em total makes no sense.
        return (kind == MarketKind::Spread).then_some(0.0);
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Display form of a line: spreads signed ("+1.25", "-1.5", "0"), totals
/// unsigned, trailing zeros trimmed either way.
pub fn format_line(value: f64, kind: MarketKind) -> String {
    let magnitude = trim_zeros(value.abs());
    match kind {
        MarketKind::Spread => {
            if value == 0.0 {
                "0".to_string()
            } else if value > 0.0 {
                format!("+{}", magnitude)
            } else {
                format!("-{}", magnitude)
            }
        }
        MarketKind::Total => magnitude,
    }
}

fn trim_zeros(value: f64) -> String {
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0');
    s.trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_lines() {
        assert_eq!(normalize_line("-1.5", MarketKind::Spread), Some(-1.5));
        assert_eq!(normalize_line("+2.5", MarketKind::Spread), Some(2.5));
        assert_eq!(normalize_line("8.5", MarketKind::Total), Some(8.5));
        assert_eq!(normalize_line("3", MarketKind::Total), Some(3.0));
    }

    #[test]
    fn test_half_symbol() {
        assert_eq!(normalize_line("o26½", MarketKind::Total), None); // odds prefix is not a line
        assert_eq!(normalize_line("26½", MarketKind::Total), Some(26.5));
        assert_eq!(normalize_line("-1½", MarketKind::Spread), Some(-1.5));
    }

    #[test]
    fn test_pick_em() {
        assert_eq!(normalize_line("pk", MarketKind::Spread), Some(0.0));
        assert_eq!(normalize_line("PK", MarketKind::Spread), Some(0.0));
        assert_eq!(normalize_line("pk", MarketKind::Total), None);
    }

    #[test]
    fn test_split_lines_average() {
        assert_eq!(normalize_line("+1,+1.5", MarketKind::Spread), Some(1.25));
        assert_eq!(normalize_line("-0.5,-1", MarketKind::Spread), Some(-0.75));
        assert_eq!(normalize_line("2.5,3", MarketKind::Total), Some(2.75));
        assert_eq!(normalize_line("2.5/3", MarketKind::Total), Some(2.75));
    }

    #[test]
    fn test_split_with_pick() {
        assert_eq!(normalize_line("pk,+0.5", MarketKind::Spread), Some(0.25));
        assert_eq!(normalize_line("pk,-0.5", MarketKind::Spread), Some(-0.25));
    }

    #[test]
    fn test_invalid_lines() {
        assert_eq!(normalize_line("", MarketKind::Spread), None);
        assert_eq!(normalize_line("abc", MarketKind::Total), None);
        assert_eq!(normalize_line("-2.5", MarketKind::Total), None);
        assert_eq!(normalize_line("1,2,3", MarketKind::Spread), None);
    }

    #[test]
    fn test_whitespace_tolerated() {
        assert_eq!(normalize_line(" +1 , +1.5 ", MarketKind::Spread), Some(1.25));
    }

    #[test]
    fn test_format_spread() {
        assert_eq!(format_line(1.25, MarketKind::Spread), "+1.25");
        assert_eq!(format_line(-1.5, MarketKind::Spread), "-1.5");
        assert_eq!(format_line(0.0, MarketKind::Spread), "0");
        assert_eq!(format_line(3.0, MarketKind::Spread), "+3");
    }

    #[test]
    fn test_format_total() {
        assert_eq!(format_line(8.5, MarketKind::Total), "8.5");
        assert_eq!(format_line(3.0, MarketKind::Total), "3");
        assert_eq!(format_line(2.75, MarketKind::Total), "2.75");
    }

    #[test]
    fn test_lines_equal_tolerance() {
        assert!(lines_equal(1.25, 1.25));
        assert!(lines_equal(1.25, 1.2501));
        assert!(!lines_equal(1.25, 1.5));
        assert!(!lines_equal(1.0, 1.25));
    }
}
