//! Classified events handed to the engine by the line classifier.
//!
//! Names are raw as they appear in the log ("You", "a gnoll pup", "Kelethin`s pet"
//! already split into pet and owner). Timestamps are seconds on a monotonic-ish
//! log clock; only differences between them matter.

use serde::{Deserialize, Serialize};

use crate::game_data::LandsOn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatEvent {
    pub timestamp: f64,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl CombatEvent {
    pub fn new(timestamp: f64, kind: EventKind) -> Self {
        Self { timestamp, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Damage(DamageRecord),
    Heal(HealRecord),
    Cast(CastRecord),
    Received(ReceivedRecord),
    Taunt(TauntRecord),
    Death(DeathRecord),
    Chat(ChatRecord),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DamageRecord {
    pub attacker: String,
    /// Owner named in the line ("Kelethin`s warder")
    #[serde(default)]
    pub attacker_owner: Option<String>,
    pub defender: String,
    #[serde(default)]
    pub defender_owner: Option<String>,
    pub amount: i64,
    /// "Hits", "DoT", "DD", "Bash", ...
    #[serde(default)]
    pub damage_type: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HealRecord {
    pub healer: String,
    pub healed: String,
    pub amount: i64,
    #[serde(default)]
    pub spell: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CastRecord {
    pub caster: String,
    pub spell: String,
    #[serde(default)]
    pub interrupted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceivedRecord {
    pub receiver: String,
    /// Landed text with the receiver's name removed
    pub phrase: String,
    pub phrase_kind: LandsOn,
    #[serde(default)]
    pub wear_off: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TauntRecord {
    pub player: String,
    pub npc: String,
    pub success: bool,
    #[serde(default)]
    pub improved: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeathRecord {
    pub killed: String,
    #[serde(default)]
    pub killer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatRecord {
    pub sender: String,
    #[serde(default)]
    pub channel: String,
}
