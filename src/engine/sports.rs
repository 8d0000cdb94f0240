//! Sport classification from team names and league strings.
//!
//! Keyword sets are data: the defaults ship here, config can extend them,
//! and the classifier refuses to start if any token lands in two sports.
//! Classification is substring containment over the joined team names in a
//! fixed priority order, which is how the book listings actually read
//! (pitcher-annotated MLB names, bare soccer club names, and so on).

use anyhow::{bail, Result};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Baseball,
    Basketball,
    Football,
    Soccer,
    Hockey,
    Combat,
    Other,
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sport::Baseball => "baseball",
            Sport::Basketball => "basketball",
            Sport::Football => "football",
            Sport::Soccer => "soccer",
            Sport::Hockey => "hockey",
            Sport::Combat => "combat",
            Sport::Other => "other",
        };
        f.write_str(s)
    }
}

/// Classification priority: combat fighters are first names and would
/// otherwise fall through everything; baseball outranks soccer because
/// pitcher-annotated listings carry stray tokens.
const CLASSIFY_ORDER: [Sport; 6] = [
    Sport::Combat,
    Sport::Baseball,
    Sport::Soccer,
    Sport::Basketball,
    Sport::Football,
    Sport::Hockey,
];

/// Per-sport keyword sets, config-shaped. Empty vectors mean "defaults".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SportKeywords {
    pub baseball: Vec<String>,
    pub basketball: Vec<String>,
    pub football: Vec<String>,
    pub soccer: Vec<String>,
    pub hockey: Vec<String>,
    pub combat: Vec<String>,
}

fn default_keywords(sport: Sport) -> &'static [&'static str] {
    match sport {
        Sport::Baseball => &[
            "blue jays", "dodgers", "mariners", "braves", "cubs", "angels", "padres", "rangers",
            "phillies", "yankees", "white sox", "giants", "marlins", "athletics", "guardians",
            "orioles", "red sox", "astros", "rockies", "cardinals", "twins", "brewers", "tigers",
            "royals", "rays", "nationals", "mets", "pirates", "diamondbacks",
        ],
        Sport::Basketball => &[
            "lakers", "warriors", "celtics", "heat", "bulls", "knicks", "nets", "suns", "mavs",
            "mavericks", "bucks", "sixers", "raptors", "pistons", "pacers", "cavaliers", "magic",
            "hawks", "hornets", "wizards", "nuggets", "trail blazers", "jazz", "thunder", "spurs",
            "rockets", "pelicans", "grizzlies", "timberwolves", "kings", "clippers",
        ],
        Sport::Football => &[
            "patriots", "bills", "dolphins", "jets", "ravens", "bengals", "browns", "steelers",
            "texans", "colts", "jaguars", "titans", "broncos", "chiefs", "raiders", "chargers",
            "cowboys", "eagles", "commanders", "bears", "lions", "packers", "vikings", "falcons",
            "panthers", "saints", "buccaneers", "rams", "seahawks", "49ers",
        ],
        Sport::Soccer => &[
            "united", "city", "arsenal", "chelsea", "liverpool", "tottenham", "brighton", "wolves",
            "wanderers", "forest", "leeds", "villa", "palace", "fulham", "bournemouth", "lyon",
            "rennais", "laval", "boulogne", "galaxy", "sounders", "real", "barcelona", "madrid",
            "atletico", "sevilla", "valencia", "betis", "sociedad", "athletic", "bayern",
            "dortmund", "leipzig", "leverkusen", "frankfurt", "stuttgart", "juventus", "milan",
            "inter", "napoli", "roma", "lazio", "fiorentina", "psg", "monaco", "marseille",
            "lille", "rennes", "nice",
        ],
        Sport::Hockey => &[
            "bruins", "sabres", "red wings", "blackhawks", "avalanche", "blue jackets", "wild",
            "predators", "blues", "flames", "oilers", "canucks", "ducks", "coyotes",
            "golden knights", "kraken", "sharks", "hurricanes", "lightning", "capitals", "flyers",
            "penguins", "islanders", "devils", "maple leafs", "senators", "canadiens",
        ],
        Sport::Combat => &[
            "amanda", "tatiana", "keith", "devin", "fernando", "anthony", "stephen",
        ],
        Sport::Other => &[],
    }
}

pub struct SportClassifier {
    sets: Vec<(Sport, Vec<String>)>,
}

impl SportClassifier {
    pub fn with_defaults() -> Result<Self> {
        Self::new(&SportKeywords::default())
    }

    /// Build the classifier: defaults plus any configured extra tokens,
    /// validated pairwise-disjoint. A token in two sports is a config error,
    /// not a tie to break at match time.
    pub fn new(extra: &SportKeywords) -> Result<Self> {
        fn extras(extra: &SportKeywords, sport: Sport) -> &[String] {
            match sport {
                Sport::Baseball => &extra.baseball,
                Sport::Basketball => &extra.basketball,
                Sport::Football => &extra.football,
                Sport::Soccer => &extra.soccer,
                Sport::Hockey => &extra.hockey,
                Sport::Combat => &extra.combat,
                Sport::Other => &[],
            }
        }

        let mut sets = Vec::new();
        for sport in CLASSIFY_ORDER {
            let mut tokens: Vec<String> = default_keywords(sport)
                .iter()
                .map(|t| t.to_string())
                .collect();
            for token in extras(extra, sport) {
                let token = token.trim().to_lowercase();
                if !token.is_empty() && !tokens.contains(&token) {
                    tokens.push(token);
                }
            }
            sets.push((sport, tokens));
        }

        for (i, (sport_a, tokens_a)) in sets.iter().enumerate() {
            for (sport_b, tokens_b) in sets.iter().skip(i + 1) {
                for token in tokens_a {
                    if tokens_b.contains(token) {
                        bail!(
                            "sport keyword {:?} assigned to both {} and {}",
                            token,
                            sport_a,
                            sport_b
                        );
                    }
                }
            }
        }

        Ok(Self { sets })
    }

    /// Classify a pairing from its two normalized team names.
    pub fn classify(&self, home_norm: &str, away_norm: &str) -> Sport {
        let combined = format!("{} {}", home_norm, away_norm).to_lowercase();
        for (sport, tokens) in &self.sets {
            if tokens.iter().any(|t| combined.contains(t.as_str())) {
                return *sport;
            }
        }
        Sport::Other
    }
}

/// Loose sport category from a league or sport string, for the matcher's
/// compatibility filter. `None` means "can't tell" and the filter passes.
pub fn league_category(label: &str) -> Option<Sport> {
    let label = label.to_lowercase();
    let contains_any = |terms: &[&str]| terms.iter().any(|t| label.contains(t));

    if contains_any(&["basketball", "nba", "wnba", "ncaab", "euroleague", "fib"]) {
        Some(Sport::Basketball)
    } else if contains_any(&["nfl", "ncaaf", "college football", "american football"]) {
        Some(Sport::Football)
    } else if contains_any(&["baseball", "mlb", "minor league"]) {
        Some(Sport::Baseball)
    } else if contains_any(&[
        "soccer",
        "mls",
        "premier league",
        "la liga",
        "bundesliga",
        "serie a",
        "ligue 1",
        "champions league",
        "europa league",
        "football",
    ]) {
        Some(Sport::Soccer)
    } else if contains_any(&["hockey", "nhl"]) {
        Some(Sport::Hockey)
    } else {
        None
    }
}

/// Whether an event's sport/league strings mark it as tennis, which gets
/// last-name matching instead of token-set scoring.
pub fn is_tennis_context(sport: Option<&str>, league: Option<&str>) -> bool {
    let tagged = |s: Option<&str>| {
        s.map(|s| {
            let s = s.to_lowercase();
            s.contains("tennis") || s.contains("atp") || s.contains("wta") || s.contains("itf")
        })
        .unwrap_or(false)
    };
    tagged(sport) || tagged(league)
}
