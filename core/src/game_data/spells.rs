//! Spell reference records

use serde::{Deserialize, Serialize};

use super::classes::SpellClass;

/// One row of the spell reference table. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellData {
    pub id: String,
    pub name: String,
    /// Name with rank suffixes removed, shared by every rank of a spell
    pub abbrv: String,
    pub beneficial: bool,
    pub class_mask: u32,
    pub lands_on_you: String,
    pub lands_on_other: String,
}

impl SpellData {
    /// Parse a `^`-delimited row: id^name^beneficial^classmask^landsOnYou^landsOnOther[^...]
    pub fn parse_row(line: &str) -> Option<SpellData> {
        let mut cols = line.trim_end_matches(['\r', '\n']).split('^');
        let id = cols.next()?.trim();
        let name = cols.next()?.trim();
        let beneficial = cols.next()?.trim();
        let class_mask = cols.next()?.trim();
        let lands_on_you = cols.next()?;
        let lands_on_other = cols.next()?;

        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) || name.is_empty() {
            return None;
        }

        Some(SpellData {
            id: id.to_string(),
            name: name.to_string(),
            abbrv: abbreviate_spell_name(name),
            beneficial: beneficial.parse::<i32>().map(|v| v != 0).unwrap_or(false),
            class_mask: class_mask.parse().unwrap_or(0),
            lands_on_you: lands_on_you.to_string(),
            lands_on_other: lands_on_other.to_string(),
        })
    }

    /// Class owning this spell when exactly one class can use it
    pub fn owning_class(&self) -> Option<SpellClass> {
        SpellClass::from_mask(self.class_mask)
    }
}

/// Strip rank information from a spell name.
///
/// "Aria of Asceticism Rk. II" and "Promised Renewal III" both lose their suffix;
/// names without one are returned unchanged.
pub fn abbreviate_spell_name(name: &str) -> String {
    if let Some(index) = name.find(" Rk. ") {
        return name[..index].to_string();
    }

    if let Some(index) = name.rfind(' ') {
        let last = &name[index + 1..];
        let is_rank = last
            .chars()
            .all(|c| matches!(c, 'I' | 'V' | 'X' | 'L' | 'C') || c.is_ascii_digit());
        if is_rank {
            return name[..index].to_string();
        }
    }

    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviation_strips_rank_suffixes() {
        assert_eq!(abbreviate_spell_name("Aria of Asceticism Rk. II"), "Aria of Asceticism");
        assert_eq!(abbreviate_spell_name("Promised Renewal III"), "Promised Renewal");
        assert_eq!(abbreviate_spell_name("Spirit of Wolf 2"), "Spirit of Wolf");
        assert_eq!(abbreviate_spell_name("Complete Heal"), "Complete Heal");
        assert_eq!(abbreviate_spell_name("Clarity"), "Clarity");
    }

    #[test]
    fn parse_row_reads_six_columns() {
        let spell = SpellData::parse_row("1234^Clarity II^1^8192^You feel clear.^ looks clear.")
            .expect("valid row");
        assert_eq!(spell.id, "1234");
        assert_eq!(spell.abbrv, "Clarity");
        assert!(spell.beneficial);
        assert_eq!(spell.owning_class(), Some(SpellClass::Enchanter));
        assert_eq!(spell.lands_on_other, " looks clear.");
    }

    #[test]
    fn parse_row_ignores_extra_columns() {
        let spell = SpellData::parse_row("7^Flame Lick^0^32^You are burned.^ is burned.^1");
        assert_eq!(spell.map(|s| s.name), Some("Flame Lick".to_string()));
    }

    #[test]
    fn parse_row_rejects_malformed_lines() {
        assert!(SpellData::parse_row("").is_none());
        assert!(SpellData::parse_row("12^Short^0").is_none());
        assert!(SpellData::parse_row("abc^Name^0^1^x^y").is_none());
        assert!(SpellData::parse_row("12^^0^1^x^y").is_none());
    }
}
