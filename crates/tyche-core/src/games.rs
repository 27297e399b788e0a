use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Multi-state draw games the pipeline knows how to validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Game {
    #[serde(rename = "Powerball")]
    Powerball,
    #[serde(rename = "Mega Millions")]
    MegaMillions,
    #[serde(rename = "Lucky for Life")]
    LuckyForLife,
    #[serde(rename = "Cash4Life")]
    Cash4Life,
    #[serde(rename = "Lotto America")]
    LottoAmerica,
}

impl Game {
    /// All games, in keyword-detection priority order.
    pub const ALL: [Game; 5] = [
        Game::Powerball,
        Game::MegaMillions,
        Game::LuckyForLife,
        Game::Cash4Life,
        Game::LottoAmerica,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Game::Powerball => "Powerball",
            Game::MegaMillions => "Mega Millions",
            Game::LuckyForLife => "Lucky for Life",
            Game::Cash4Life => "Cash4Life",
            Game::LottoAmerica => "Lotto America",
        }
    }

    /// Lowercase needles that identify this game in a host, path, or text.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Game::Powerball => &["powerball", "double play"],
            Game::MegaMillions => &["mega millions", "megamillions", "mega-millions", "mega ball"],
            Game::LuckyForLife => &["lucky for life", "luckyforlife", "lucky-for-life", "lucky ball"],
            Game::Cash4Life => &["cash4life", "cash 4 life", "cash-4-life", "cash for life", "cash ball"],
            Game::LottoAmerica => &["lotto america", "lottoamerica", "lotto-america", "star ball"],
        }
    }

    /// JSON keys (lowercased, separators removed) that carry this game's bonus ball.
    pub fn bonus_keys(&self) -> &'static [&'static str] {
        match self {
            Game::Powerball => &["fieldpowerball", "powerball", "pb", "redball"],
            Game::MegaMillions => &["megaball", "mball", "mega", "mb"],
            Game::LuckyForLife => &["luckyball", "fieldluckyball"],
            Game::Cash4Life => &["cashball", "fieldcashball"],
            Game::LottoAmerica => &["starball", "fieldstarball"],
        }
    }

    /// Detect a game from free text by keyword, in priority order.
    pub fn detect(text: &str) -> Option<Game> {
        let lower = text.to_lowercase();
        Game::ALL
            .into_iter()
            .find(|game| game.keywords().iter().any(|k| lower.contains(k)))
    }

    /// Identify the game whose bonus ball a JSON key names.
    pub fn from_bonus_key(key: &str) -> Option<Game> {
        let folded = fold_key(key);
        Game::ALL
            .into_iter()
            .find(|game| game.bonus_keys().contains(&folded.as_str()))
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Game {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold_key(s).as_str() {
            "powerball" => Ok(Game::Powerball),
            "megamillions" => Ok(Game::MegaMillions),
            "luckyforlife" => Ok(Game::LuckyForLife),
            "cash4life" | "cashforlife" => Ok(Game::Cash4Life),
            "lottoamerica" => Ok(Game::LottoAmerica),
            _ => Err(format!("Unknown game: {s}")),
        }
    }
}

/// Lowercase and drop everything but ASCII letters and digits.
///
/// `field_draw_date`, `DrawDate` and `draw-date` all fold to `drawdate`.
pub fn fold_key(key: &str) -> String {
    key.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Validation rule for one game's main and bonus balls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRule {
    pub game: Game,
    pub main_count: usize,
    pub main_range: RangeInclusive<u32>,
    pub bonus_count: usize,
    pub bonus_range: RangeInclusive<u32>,
    pub bonus_label: &'static str,
}

/// Static registry of [`GameRule`]s, one per supported game.
#[derive(Debug, Clone)]
pub struct GameRuleTable {
    rules: [GameRule; 5],
}

impl GameRuleTable {
    pub fn new() -> Self {
        let rule = |game, main_hi, bonus_hi, bonus_label| GameRule {
            game,
            main_count: 5,
            main_range: 1..=main_hi,
            bonus_count: 1,
            bonus_range: 1..=bonus_hi,
            bonus_label,
        };

        Self {
            rules: [
                rule(Game::Powerball, 69, 26, "Powerball"),
                rule(Game::MegaMillions, 70, 25, "Mega Ball"),
                rule(Game::LuckyForLife, 48, 18, "Lucky Ball"),
                rule(Game::Cash4Life, 60, 4, "Cash Ball"),
                rule(Game::LottoAmerica, 52, 10, "Star Ball"),
            ],
        }
    }

    pub fn get(&self, game: Game) -> &GameRule {
        // Rules are laid out in declaration order of `Game`.
        &self.rules[game as usize]
    }

    /// Look up a rule by display name or alias ("Cash 4 Life", "mega millions").
    pub fn lookup(&self, name: &str) -> Option<&GameRule> {
        name.parse::<Game>().ok().map(|game| self.get(game))
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameRule> {
        self.rules.iter()
    }
}

impl Default for GameRuleTable {
    fn default() -> Self {
        Self::new()
    }
}
