//! Taunt counts and success rates per player
//!
//! Regular taunts count towards the success rate; improved taunts are
//! reported on their own. Each player row carries a child row per NPC.

use hashbrown::HashMap;

use super::round2;
use crate::encounter::Fight;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TauntCounts {
    pub name: String,
    pub taunt: u32,
    pub failed: u32,
    pub improved: u32,
    /// Successful share of regular taunts, in percent
    pub success_rate: f64,
}

impl TauntCounts {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn add(&mut self, success: bool, improved: bool) {
        if improved {
            self.improved += 1;
        } else if success {
            self.taunt += 1;
        } else {
            self.failed += 1;
        }
    }

    fn finish(&mut self) {
        let attempts = self.taunt + self.failed;
        self.success_rate = if attempts > 0 {
            round2(self.taunt as f64 / attempts as f64 * 100.0)
        } else {
            0.0
        };
    }
}

/// A player's taunt totals with a breakdown per NPC
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TauntStats {
    pub totals: TauntCounts,
    pub by_npc: Vec<TauntCounts>,
}

/// Taunt statistics over `fights`, most taunts first
pub fn taunt_stats(fights: &[Fight]) -> Vec<TauntStats> {
    let mut players: HashMap<String, (TauntCounts, HashMap<String, TauntCounts>)> = HashMap::new();

    for fight in fights {
        for entry in &fight.taunts {
            let (totals, by_npc) = players
                .entry(entry.player.clone())
                .or_insert_with(|| (TauntCounts::named(&entry.player), HashMap::new()));
            totals.add(entry.success, entry.improved);
            by_npc
                .entry(fight.name.clone())
                .or_insert_with(|| TauntCounts::named(&fight.name))
                .add(entry.success, entry.improved);
        }
    }

    let mut stats: Vec<TauntStats> = players
        .into_values()
        .map(|(mut totals, by_npc)| {
            totals.finish();
            let mut by_npc: Vec<TauntCounts> = by_npc
                .into_values()
                .map(|mut counts| {
                    counts.finish();
                    counts
                })
                .collect();
            by_npc.sort_by(|a, b| b.taunt.cmp(&a.taunt).then_with(|| a.name.cmp(&b.name)));
            TauntStats { totals, by_npc }
        })
        .collect();

    stats.sort_by(|a, b| {
        b.totals
            .taunt
            .cmp(&a.totals.taunt)
            .then_with(|| a.totals.name.cmp(&b.totals.name))
    });
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::TauntEntry;

    fn fight_with(name: &str, taunts: &[(&str, bool, bool)]) -> Fight {
        let mut fight = Fight::new(1, name, 0.0);
        for (i, (player, success, improved)) in taunts.iter().enumerate() {
            fight.add_taunt(TauntEntry {
                player: player.to_string(),
                success: *success,
                improved: *improved,
                timestamp: i as f64,
            });
        }
        fight
    }

    #[test]
    fn success_rate_ignores_improved_taunts() {
        let fights = vec![
            fight_with("a gnoll", &[("Tank", true, false), ("Tank", false, false), ("Tank", true, true)]),
            fight_with("a bat", &[("Tank", true, false), ("Tank", true, false)]),
        ];
        let stats = taunt_stats(&fights);

        assert_eq!(stats.len(), 1);
        let tank = &stats[0].totals;
        assert_eq!((tank.taunt, tank.failed, tank.improved), (3, 1, 1));
        assert_eq!(tank.success_rate, 75.0);
        assert_eq!(stats[0].by_npc[0].name, "a bat");
        assert_eq!(stats[0].by_npc[0].success_rate, 100.0);
    }

    #[test]
    fn rate_rounds_to_two_decimals() {
        let fights = vec![fight_with(
            "a gnoll",
            &[("Tank", true, false), ("Tank", false, false), ("Tank", false, false)],
        )];
        assert_eq!(taunt_stats(&fights)[0].totals.success_rate, 33.33);
    }

    #[test]
    fn sorted_by_taunt_count() {
        let fights = vec![fight_with(
            "a gnoll",
            &[("Alpha", true, false), ("Beta", true, false), ("Beta", true, false)],
        )];
        let names: Vec<String> = taunt_stats(&fights).into_iter().map(|s| s.totals.name).collect();
        assert_eq!(names, vec!["Beta", "Alpha"]);
    }
}
