use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

// ============ Request Models ============

/// Query string accepted by `GET /api/player-info`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerQueryParams {
    /// Numeric player identifier.
    pub uid: Option<String>,
    /// Server region code (case-insensitive, defaults to the configured region).
    pub region: Option<String>,
}

// ============ Field Values ============

/// Placeholder substituted when no provider yields a usable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    /// `"-"`: missing numeric or text field.
    Dash,
    /// `"Unknown"`: missing person name.
    Unknown,
    /// `"None"`: missing entity (pet, guild) or free text.
    None,
}

impl Sentinel {
    pub fn as_str(self) -> &'static str {
        match self {
            Sentinel::Dash => "-",
            Sentinel::Unknown => "Unknown",
            Sentinel::None => "None",
        }
    }
}

/// A resolved canonical field.
///
/// Provider scalars are carried through untouched, so a numeric level stays a
/// JSON number and a string level stays a string. Placeholders are `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl FieldValue {
    /// Converts a provider value into a field value.
    ///
    /// Returns `None` for null, the empty string, and non-scalar values
    /// (objects and arrays). Zero and `false` are kept.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(FieldValue::Bool(*b)),
            Value::Number(n) => Some(FieldValue::Number(n.clone())),
            Value::String(s) if !s.is_empty() => Some(FieldValue::Text(s.clone())),
            _ => None,
        }
    }

    pub fn placeholder(sentinel: Sentinel) -> Self {
        FieldValue::Text(sentinel.as_str().to_string())
    }

    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// True when this value is one of the three placeholder sentinels.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s == "-" || s == "Unknown" || s == "None")
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

// ============ Canonical Profile ============

/// A flat mapping from canonical field name to resolved value.
pub type Section = BTreeMap<String, FieldValue>;

/// Identifies one table-driven section of the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionId {
    Basic,
    Appearance,
    BattleStats,
    Pet,
    Guild,
    Captain,
    Social,
    Weapons,
}

impl SectionId {
    pub const ALL: [SectionId; 8] = [
        SectionId::Basic,
        SectionId::Appearance,
        SectionId::BattleStats,
        SectionId::Pet,
        SectionId::Guild,
        SectionId::Captain,
        SectionId::Social,
        SectionId::Weapons,
    ];

    /// Key used for this section in the JSON response.
    pub fn wire_name(self) -> &'static str {
        match self {
            SectionId::Basic => "basic",
            SectionId::Appearance => "appearance",
            SectionId::BattleStats => "battleStats",
            SectionId::Pet => "pet",
            SectionId::Guild => "guild",
            SectionId::Captain => "captain",
            SectionId::Social => "social",
            SectionId::Weapons => "weapons",
        }
    }
}

/// Image URLs handed to the browser as-is. They are never fetched server side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaLinks {
    pub outfit_url: String,
    pub banner_url: String,
}

/// When and by which response schema the profile was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvenanceMetadata {
    /// RFC 3339 UTC timestamp of reconciliation.
    pub fetched_at: String,
    /// Response schema version.
    pub api_version: String,
}

/// Unified player profile served by `GET /api/player-info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalProfile {
    /// Identity: nickname, uid, level, region, timestamps, signature.
    pub basic: Section,
    /// Badge, banner, avatar and title identifiers.
    pub appearance: Section,
    /// Ranked points, rank labels, season and provider scores.
    pub battle_stats: Section,
    /// Companion pet.
    pub pet: Section,
    /// Guild (clan) and its owner as reported with the guild.
    pub guild: Section,
    /// Guild leader as reported by the secondary provider.
    pub captain: Section,
    /// Social preferences.
    pub social: Section,
    /// Weapon skin loadout.
    pub weapons: Section,
    pub images: MediaLinks,
    pub metadata: ProvenanceMetadata,
}

impl CanonicalProfile {
    pub(crate) fn empty(images: MediaLinks, metadata: ProvenanceMetadata) -> Self {
        Self {
            basic: Section::new(),
            appearance: Section::new(),
            battle_stats: Section::new(),
            pet: Section::new(),
            guild: Section::new(),
            captain: Section::new(),
            social: Section::new(),
            weapons: Section::new(),
            images,
            metadata,
        }
    }

    pub fn section(&self, id: SectionId) -> &Section {
        match id {
            SectionId::Basic => &self.basic,
            SectionId::Appearance => &self.appearance,
            SectionId::BattleStats => &self.battle_stats,
            SectionId::Pet => &self.pet,
            SectionId::Guild => &self.guild,
            SectionId::Captain => &self.captain,
            SectionId::Social => &self.social,
            SectionId::Weapons => &self.weapons,
        }
    }

    pub(crate) fn section_mut(&mut self, id: SectionId) -> &mut Section {
        match id {
            SectionId::Basic => &mut self.basic,
            SectionId::Appearance => &mut self.appearance,
            SectionId::BattleStats => &mut self.battle_stats,
            SectionId::Pet => &mut self.pet,
            SectionId::Guild => &mut self.guild,
            SectionId::Captain => &mut self.captain,
            SectionId::Social => &mut self.social,
            SectionId::Weapons => &mut self.weapons,
        }
    }

    /// Looks up a single resolved field.
    pub fn field(&self, id: SectionId, name: &str) -> Option<&FieldValue> {
        self.section(id).get(name)
    }
}
