//! Win tally across races
//!
//! One entry per color name, kept in the order colors first won.

use serde::{Deserialize, Serialize};

/// Wins recorded for one player color
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub color_name: String,
    pub wins: u32,
}

/// Scoreboard of race wins
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub entries: Vec<ScoreEntry>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record a win. Returns the color's new total.
    pub fn record_win(&mut self, color_name: &str) -> u32 {
        match self.entries.iter_mut().find(|e| e.color_name == color_name) {
            Some(entry) => {
                entry.wins += 1;
                entry.wins
            }
            None => {
                self.entries.push(ScoreEntry {
                    color_name: color_name.to_string(),
                    wins: 1,
                });
                1
            }
        }
    }

    /// Wins for a color (0 if it never won)
    pub fn wins(&self, color_name: &str) -> u32 {
        self.entries
            .iter()
            .find(|e| e.color_name == color_name)
            .map(|e| e.wins)
            .unwrap_or(0)
    }

    /// Entries sorted by wins, descending. Ties keep first-win order.
    pub fn standings(&self) -> Vec<ScoreEntry> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.wins.cmp(&a.wins));
        sorted
    }

    /// Current leader (if any)
    pub fn leader(&self) -> Option<&ScoreEntry> {
        self.entries
            .iter()
            .fold(None, |best: Option<&ScoreEntry>, e| match best {
                Some(b) if b.wins >= e.wins => Some(b),
                _ => Some(e),
            })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        log::info!("Scoreboard reset");
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_standings() {
        let mut board = Scoreboard::new();
        board.record_win("Salad");
        board.record_win("Burger");
        assert_eq!(board.record_win("Burger"), 2);

        let standings = board.standings();
        assert_eq!(standings[0].color_name, "Burger");
        assert_eq!(standings[1].color_name, "Salad");
        assert_eq!(board.wins("Pizza"), 0);
    }

    #[test]
    fn test_leader_prefers_first_on_tie() {
        let mut board = Scoreboard::new();
        assert!(board.leader().is_none());
        board.record_win("Banana");
        board.record_win("Pizza");
        assert_eq!(board.leader().map(|e| e.color_name.as_str()), Some("Banana"));
    }

    #[test]
    fn test_json_and_reset() {
        let mut board = Scoreboard::new();
        board.record_win("Ice Cream");
        let restored = Scoreboard::from_json(&board.to_json().unwrap()).unwrap();
        assert_eq!(restored, board);

        board.reset();
        assert!(board.is_empty());
    }
}
