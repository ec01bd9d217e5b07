//! Text rendering of stats results
//!
//! Titles are built once per query by the stats builder so that every
//! consumer shows the same header. [`SummaryBuilder`] turns a result into the
//! one-line parse players paste into chat, or a plain table for terminals.

use std::fmt::Write;

use eqlog_types::{CombinedStats, PlayerStats, StatKind};

use crate::query::TauntStats;

// ─────────────────────────────────────────────────────────────────────────────
// Number and title formatting
// ─────────────────────────────────────────────────────────────────────────────

/// Abbreviate a total with a K/M/B suffix and at most two decimals
pub fn format_totals(total: i64) -> String {
    let (scaled, suffix) = match total.unsigned_abs() {
        0..1_000 => return total.to_string(),
        1_000..1_000_000 => (total as f64 / 1_000.0, "K"),
        1_000_000..1_000_000_000 => (total as f64 / 1_000_000.0, "M"),
        _ => (total as f64 / 1_000_000_000.0, "B"),
    };
    let rounded = format!("{:.2}", scaled);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed}{suffix}")
}

/// Rates are shown as whole numbers before abbreviating
pub fn format_rate(rate: f64) -> String {
    format_totals(rate.round() as i64)
}

pub fn target_title(fight_name: &str, fight_count: u32) -> String {
    if fight_count > 1 {
        format!("C({fight_count}): {fight_name}")
    } else {
        fight_name.to_string()
    }
}

pub fn time_title(seconds: f64) -> String {
    format!("in {seconds}s")
}

pub fn total_title(kind: StatKind, total: i64, rate: f64) -> String {
    format!("{} {} @{}", format_totals(total), kind.label(), format_rate(rate))
}

fn join_title(target: &str, time: &str, totals: &str) -> String {
    let mut title = target.to_string();
    if !time.is_empty() {
        title.push(' ');
        title.push_str(time);
    }
    if !totals.is_empty() {
        title.push_str(", ");
        title.push_str(totals);
    }
    title
}

// ─────────────────────────────────────────────────────────────────────────────
// Shareable summaries
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOptions {
    /// Keep the " +Pets" suffix on merged rows
    pub show_pet_label: bool,
    pub show_dps: bool,
    pub show_totals: bool,
    pub rank_players: bool,
    pub show_time: bool,
    /// Replaces the target title when set
    pub custom_title: Option<String>,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            show_pet_label: true,
            show_dps: true,
            show_totals: true,
            rank_players: true,
            show_time: true,
            custom_title: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatsSummary {
    pub title: String,
    pub ranked_players: Vec<String>,
}

impl StatsSummary {
    /// Single line suitable for pasting into game chat
    pub fn to_shareable(&self) -> String {
        if self.ranked_players.is_empty() {
            self.title.clone()
        } else {
            format!("{} --- {}", self.title, self.ranked_players.join(" | "))
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SummaryBuilder {
    options: SummaryOptions,
}

impl SummaryBuilder {
    pub fn new(options: SummaryOptions) -> Self {
        Self { options }
    }

    /// Summarize `selected` rows, or every row of `stats` when none are given.
    /// Rows are listed by total, highest first.
    pub fn build(&self, stats: &CombinedStats, selected: Option<&[PlayerStats]>) -> StatsSummary {
        let opts = &self.options;
        let mut rows: Vec<&PlayerStats> = selected.unwrap_or(stats.stats_list.as_slice()).iter().collect();
        rows.sort_by(|a, b| b.total.cmp(&a.total));

        let ranked_players = rows
            .into_iter()
            .map(|row| {
                let name = if opts.show_pet_label {
                    row.name.as_str()
                } else {
                    row.orig_name.as_str()
                };
                let mut line = if opts.rank_players {
                    format!("{}. {} = ", row.rank, name)
                } else {
                    format!("{name} = ")
                };
                line.push_str(&format_totals(row.total));
                if opts.show_dps {
                    line.push('@');
                    line.push_str(&format_rate(row.dps));
                }
                if opts.show_time {
                    line.push(' ');
                    line.push_str(&time_title(row.total_seconds));
                }
                line
            })
            .collect();

        let target = opts.custom_title.as_deref().unwrap_or(&stats.target_title);
        let time = if opts.show_time { stats.time_title.as_str() } else { "" };
        let totals = match (opts.show_totals, opts.show_dps) {
            (false, _) => "",
            (true, true) => stats.total_title.as_str(),
            (true, false) => stats
                .total_title
                .split(" @")
                .next()
                .unwrap_or_default(),
        };

        StatsSummary {
            title: join_title(target, time, totals),
            ranked_players,
        }
    }

    /// Multi-line table with a raid total footer
    pub fn to_table(&self, stats: &CombinedStats) -> String {
        let rate = stats.kind.rate_label();
        let mut out = String::new();
        let _ = writeln!(out, "{} {}", stats.target_title, stats.time_title);
        let _ = writeln!(
            out,
            "{:>4}  {:<28} {:<14} {:>10} {:>9} {:>6}",
            "#", "Name", "Class", stats.kind.label(), rate, "Secs"
        );
        for row in &stats.stats_list {
            let name = if self.options.show_pet_label {
                &row.name
            } else {
                &row.orig_name
            };
            let _ = writeln!(
                out,
                "{:>4}  {:<28} {:<14} {:>10} {:>9} {:>6}",
                row.rank,
                name,
                row.class_name,
                format_totals(row.total),
                format_rate(row.dps),
                row.total_seconds
            );
        }
        let raid = &stats.raid_stats;
        let _ = write!(
            out,
            "{:>4}  {:<28} {:<14} {:>10} {:>9} {:>6}",
            "",
            "Total",
            "",
            format_totals(raid.total),
            format_rate(raid.dps),
            raid.total_seconds
        );
        out
    }
}

/// One line per player followed by an indented line per NPC
pub fn format_taunts(stats: &[TauntStats]) -> String {
    let mut out = String::new();
    for player in stats {
        let t = &player.totals;
        let _ = writeln!(
            out,
            "{}: {} taunts, {} failed, {} improved ({}% success)",
            t.name, t.taunt, t.failed, t.improved, t.success_rate
        );
        for npc in &player.by_npc {
            let _ = writeln!(
                out,
                "    {}: {} taunts, {} failed, {} improved ({}% success)",
                npc.name, npc.taunt, npc.failed, npc.improved, npc.success_rate
            );
        }
    }
    out
}

/// One entry of the fight list
#[derive(Debug, Clone, PartialEq)]
pub struct FightOverview {
    pub name: String,
    /// Start time as `HH:MM:SS`
    pub began_at: String,
    pub seconds: f64,
    pub damage_total: i64,
    pub dead: bool,
    /// Players who died while the fight was running
    pub deaths: Vec<String>,
}

pub fn format_fights(fights: &[FightOverview]) -> String {
    let mut out = String::new();
    for fight in fights {
        let state = if fight.dead { "done" } else { "active" };
        let _ = write!(
            out,
            "{} {} ({}) {} Damage {}",
            fight.began_at,
            fight.name,
            state,
            format_totals(fight.damage_total),
            time_title(fight.seconds)
        );
        if !fight.deaths.is_empty() {
            let _ = write!(out, ", died: {}", fight.deaths.join(", "));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::TauntCounts;

    fn row(rank: u16, name: &str, orig: &str, total: i64, dps: f64, secs: f64) -> PlayerStats {
        PlayerStats {
            rank,
            name: name.to_string(),
            orig_name: orig.to_string(),
            class_name: String::new(),
            total,
            dps,
            total_seconds: secs,
        }
    }

    fn sample() -> CombinedStats {
        CombinedStats {
            kind: StatKind::Damage,
            stats_list: vec![
                row(2, "Bravo", "Bravo", 500, 50.0, 10.0),
                row(1, "Alpha +Pets", "Alpha", 1500, 150.0, 10.0),
            ],
            raid_stats: row(0, "a gnoll", "a gnoll", 2000, 200.0, 10.0),
            target_title: target_title("a gnoll", 1),
            time_title: time_title(10.0),
            total_title: total_title(StatKind::Damage, 2000, 200.0),
            fight_count: 1,
        }
    }

    #[test]
    fn totals_use_suffixes() {
        assert_eq!(format_totals(999), "999");
        assert_eq!(format_totals(1500), "1.5K");
        assert_eq!(format_totals(1000), "1K");
        assert_eq!(format_totals(12_340), "12.34K");
        assert_eq!(format_totals(2_500_000), "2.5M");
        assert_eq!(format_totals(3_000_000_000), "3B");
        assert_eq!(format_rate(149.6), "150");
    }

    #[test]
    fn titles() {
        assert_eq!(target_title("a gnoll", 1), "a gnoll");
        assert_eq!(target_title("a gnoll", 3), "C(3): a gnoll");
        assert_eq!(time_title(10.0), "in 10s");
        assert_eq!(time_title(2.5), "in 2.5s");
        assert_eq!(total_title(StatKind::Tanking, 1500, 15.0), "1.5K Tanked @15");
    }

    #[test]
    fn shareable_line_orders_by_total() {
        let summary = SummaryBuilder::default().build(&sample(), None);
        assert_eq!(
            summary.to_shareable(),
            "a gnoll in 10s, 2K Damage @200 --- 1. Alpha +Pets = 1.5K@150 in 10s | 2. Bravo = 500@50 in 10s"
        );
    }

    #[test]
    fn options_strip_labels_and_rates() {
        let builder = SummaryBuilder::new(SummaryOptions {
            show_pet_label: false,
            show_dps: false,
            rank_players: false,
            show_time: false,
            custom_title: Some("Raid".to_string()),
            ..Default::default()
        });
        let stats = sample();
        let summary = builder.build(&stats, Some(&stats.stats_list[1..]));
        assert_eq!(summary.title, "Raid, 2K Damage");
        assert_eq!(summary.ranked_players, vec!["Alpha = 1.5K"]);
    }

    #[test]
    fn empty_selection_is_title_only() {
        let summary = SummaryBuilder::default().build(&sample(), Some(&[][..]));
        assert_eq!(summary.to_shareable(), "a gnoll in 10s, 2K Damage @200");
    }

    #[test]
    fn table_has_row_per_player_and_footer() {
        let table = SummaryBuilder::default().to_table(&sample());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "a gnoll in 10s");
        assert!(lines[1].contains("DPS"));
        assert!(lines[2].contains("Bravo"));
        assert!(lines[4].contains("Total") && lines[4].contains("2K"));
    }

    #[test]
    fn taunt_lines() {
        let stats = vec![TauntStats {
            totals: TauntCounts {
                name: "Firiona".to_string(),
                taunt: 3,
                failed: 1,
                improved: 0,
                success_rate: 75.0,
            },
            by_npc: vec![TauntCounts {
                name: "a gnoll".to_string(),
                taunt: 3,
                failed: 1,
                improved: 0,
                success_rate: 75.0,
            }],
        }];
        let text = format_taunts(&stats);
        assert_eq!(
            text,
            "Firiona: 3 taunts, 1 failed, 0 improved (75% success)\n    a gnoll: 3 taunts, 1 failed, 0 improved (75% success)\n"
        );
    }

    #[test]
    fn fight_lines_list_deaths() {
        let fights = vec![
            FightOverview {
                name: "a gnoll".to_string(),
                began_at: "01:01:01".to_string(),
                seconds: 12.0,
                damage_total: 1_500,
                dead: true,
                deaths: vec!["Kelethin".to_string(), "Firiona".to_string()],
            },
            FightOverview {
                name: "a bat".to_string(),
                began_at: "01:02:00".to_string(),
                seconds: 0.0,
                damage_total: 40,
                dead: false,
                deaths: Vec::new(),
            },
        ];
        assert_eq!(
            format_fights(&fights),
            "01:01:01 a gnoll (done) 1.5K Damage in 12s, died: Kelethin, Firiona\n01:02:00 a bat (active) 40 Damage in 0s\n"
        );
    }
}
