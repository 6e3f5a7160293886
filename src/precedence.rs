//! Field-level provider precedence.
//!
//! Every canonical field is described by one [`FieldRule`]. Candidates are
//! tried in order and the first usable value wins, so the order of a
//! candidate list *is* the provider priority for that field.
//!
//! Source indices refer to the payload order handed to the reconciler:
//! [`PRIMARY`] is the `/info` provider (body wrapped in `data`), [`SECONDARY`]
//! is the `/player-info` provider (body rooted at `player_info`).

use crate::models::{SectionId, Sentinel};
use crate::models::SectionId::{
    Appearance, Basic, BattleStats, Captain, Guild, Pet, Social, Weapons,
};

pub const PRIMARY: usize = 0;
pub const SECONDARY: usize = 1;

/// A path into one provider payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub source: usize,
    pub path: &'static [&'static str],
}

macro_rules! primary {
    ($($segment:literal),+ $(,)?) => {
        Candidate {
            source: PRIMARY,
            path: &[$($segment),+],
        }
    };
}

macro_rules! secondary {
    ($($segment:literal),+ $(,)?) => {
        Candidate {
            source: SECONDARY,
            path: &[$($segment),+],
        }
    };
}

/// What a field falls back to when no candidate is usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    Placeholder(Sentinel),
    /// The caller-supplied region, uppercased.
    CallerRegion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Echo the caller's subject identifier.
    SubjectId,
    /// First usable candidate, else the fallback.
    FirstOf(&'static [Candidate], Fallback),
    /// Readable value verbatim, else the epoch value formatted, else `"-"`.
    Timestamp {
        readable: Option<Candidate>,
        epoch: Candidate,
    },
    /// A list of identifiers joined with `", "`, else `"-"`.
    Joined(Candidate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub section: SectionId,
    pub name: &'static str,
    pub rule: Rule,
}

const fn field(section: SectionId, name: &'static str, rule: Rule) -> FieldRule {
    FieldRule {
        section,
        name,
        rule,
    }
}

const DASH: Fallback = Fallback::Placeholder(Sentinel::Dash);
const UNKNOWN: Fallback = Fallback::Placeholder(Sentinel::Unknown);
const NONE: Fallback = Fallback::Placeholder(Sentinel::None);

/// Keys whose presence means "this provider has a record for the subject".
pub const PRESENCE_MARKERS: &[Candidate] = &[
    primary!["data", "player_info"],
    secondary!["player_info"],
];

pub static PROFILE_FIELDS: &[FieldRule] = &[
    // basic
    field(
        Basic,
        "nickname",
        Rule::FirstOf(
            &[
                primary!["data", "player_info", "nikname"],
                secondary!["player_info", "basicInfo", "nickname"],
            ],
            UNKNOWN,
        ),
    ),
    field(Basic, "uid", Rule::SubjectId),
    field(
        Basic,
        "level",
        Rule::FirstOf(
            &[
                primary!["data", "player_info", "level"],
                secondary!["player_info", "basicInfo", "level"],
            ],
            DASH,
        ),
    ),
    field(
        Basic,
        "exp",
        Rule::FirstOf(
            &[
                primary!["data", "player_info", "exp"],
                secondary!["player_info", "basicInfo", "exp"],
            ],
            DASH,
        ),
    ),
    field(
        Basic,
        "likes",
        Rule::FirstOf(
            &[
                primary!["data", "player_info", "likes"],
                secondary!["player_info", "basicInfo", "liked"],
            ],
            DASH,
        ),
    ),
    field(
        Basic,
        "region",
        Rule::FirstOf(
            &[
                primary!["data", "player_info", "region"],
                secondary!["player_info", "basicInfo", "region"],
            ],
            Fallback::CallerRegion,
        ),
    ),
    field(
        Basic,
        "accountCreated",
        Rule::Timestamp {
            readable: Some(primary!["data", "player_info", "account_created"]),
            epoch: secondary!["player_info", "basicInfo", "createAt"],
        },
    ),
    field(
        Basic,
        "lastLogin",
        Rule::Timestamp {
            readable: Some(primary!["data", "player_info", "last_login"]),
            epoch: secondary!["player_info", "basicInfo", "lastLoginAt"],
        },
    ),
    field(
        Basic,
        "signature",
        Rule::FirstOf(
            &[
                primary!["data", "player_info", "signature"],
                secondary!["player_info", "socialInfo", "signature"],
            ],
            NONE,
        ),
    ),
    // appearance
    field(
        Appearance,
        "badgeCount",
        Rule::FirstOf(&[secondary!["player_info", "basicInfo", "badgeCnt"]], DASH),
    ),
    field(
        Appearance,
        "badgeId",
        Rule::FirstOf(&[secondary!["player_info", "basicInfo", "badgeId"]], DASH),
    ),
    field(
        Appearance,
        "bannerId",
        Rule::FirstOf(
            &[
                primary!["data", "player_info", "banner_id"],
                secondary!["player_info", "basicInfo", "bannerId"],
            ],
            DASH,
        ),
    ),
    field(
        Appearance,
        "avatarId",
        Rule::FirstOf(
            &[
                primary!["data", "player_info", "avatar_id"],
                secondary!["player_info", "basicInfo", "headPic"],
            ],
            DASH,
        ),
    ),
    field(
        Appearance,
        "titleId",
        Rule::FirstOf(
            &[
                primary!["data", "player_info", "title_id"],
                secondary!["player_info", "basicInfo", "title"],
            ],
            DASH,
        ),
    ),
    // battleStats
    field(
        BattleStats,
        "brRankPoints",
        Rule::FirstOf(
            &[
                primary!["data", "player_info", "br_rank_points"],
                secondary!["player_info", "basicInfo", "rankingPoints"],
            ],
            DASH,
        ),
    ),
    field(
        BattleStats,
        "csRankPoints",
        Rule::FirstOf(
            &[
                primary!["data", "player_info", "cs_rank_points"],
                secondary!["player_info", "basicInfo", "csRankingPoints"],
            ],
            DASH,
        ),
    ),
    field(
        BattleStats,
        "bpLevel",
        Rule::FirstOf(
            &[
                primary!["data", "player_info", "bp_level"],
                secondary!["player_info", "basicInfo", "primeLevel", "level"],
            ],
            DASH,
        ),
    ),
    field(
        BattleStats,
        "csMaxRank",
        Rule::FirstOf(&[secondary!["player_info", "basicInfo", "csMaxRank"]], DASH),
    ),
    field(
        BattleStats,
        "csRank",
        Rule::FirstOf(&[secondary!["player_info", "basicInfo", "csRank"]], DASH),
    ),
    field(
        BattleStats,
        "maxRank",
        Rule::FirstOf(&[secondary!["player_info", "basicInfo", "maxRank"]], DASH),
    ),
    field(
        BattleStats,
        "rank",
        Rule::FirstOf(&[secondary!["player_info", "basicInfo", "rank"]], DASH),
    ),
    field(
        BattleStats,
        "seasonId",
        Rule::FirstOf(&[secondary!["player_info", "basicInfo", "seasonId"]], DASH),
    ),
    field(
        BattleStats,
        "releaseVersion",
        Rule::FirstOf(
            &[
                primary!["data", "player_info", "release_version"],
                secondary!["player_info", "basicInfo", "releaseVersion"],
            ],
            DASH,
        ),
    ),
    field(
        BattleStats,
        "diamondCost",
        Rule::FirstOf(
            &[secondary!["player_info", "diamondCostRes", "diamondCost"]],
            DASH,
        ),
    ),
    field(
        BattleStats,
        "creditScore",
        Rule::FirstOf(
            &[secondary!["player_info", "creditScoreInfo", "creditScore"]],
            DASH,
        ),
    ),
    // pet
    field(
        Pet,
        "name",
        Rule::FirstOf(
            &[
                primary!["data", "petInfo", "name"],
                secondary!["player_info", "petInfo", "name"],
            ],
            NONE,
        ),
    ),
    field(
        Pet,
        "level",
        Rule::FirstOf(
            &[
                primary!["data", "petInfo", "level"],
                secondary!["player_info", "petInfo", "level"],
            ],
            DASH,
        ),
    ),
    field(
        Pet,
        "exp",
        Rule::FirstOf(
            &[
                primary!["data", "petInfo", "exp"],
                secondary!["player_info", "petInfo", "exp"],
            ],
            DASH,
        ),
    ),
    field(
        Pet,
        "selectedSkillId",
        Rule::FirstOf(
            &[
                primary!["data", "petInfo", "selected_skill_id"],
                secondary!["player_info", "petInfo", "selectedSkillId"],
            ],
            DASH,
        ),
    ),
    field(
        Pet,
        "skinId",
        Rule::FirstOf(
            &[
                primary!["data", "petInfo", "skin_id"],
                secondary!["player_info", "petInfo", "skinId"],
            ],
            DASH,
        ),
    ),
    // guild
    field(
        Guild,
        "name",
        Rule::FirstOf(
            &[
                primary!["data", "guildInfo", "name"],
                secondary!["player_info", "clanBasicInfo", "clanName"],
            ],
            NONE,
        ),
    ),
    field(
        Guild,
        "level",
        Rule::FirstOf(
            &[
                primary!["data", "guildInfo", "level"],
                secondary!["player_info", "clanBasicInfo", "clanLevel"],
            ],
            DASH,
        ),
    ),
    field(
        Guild,
        "capacity",
        Rule::FirstOf(
            &[
                primary!["data", "guildInfo", "capacity"],
                secondary!["player_info", "clanBasicInfo", "capacity"],
            ],
            DASH,
        ),
    ),
    field(
        Guild,
        "members",
        Rule::FirstOf(
            &[
                primary!["data", "guildInfo", "members"],
                secondary!["player_info", "clanBasicInfo", "memberNum"],
            ],
            DASH,
        ),
    ),
    field(
        Guild,
        "guildId",
        Rule::FirstOf(
            &[
                primary!["data", "guildInfo", "guild_id"],
                secondary!["player_info", "clanBasicInfo", "clanId"],
            ],
            DASH,
        ),
    ),
    field(
        Guild,
        "ownerUid",
        Rule::FirstOf(
            &[
                primary!["data", "guildInfo", "owner"],
                secondary!["player_info", "clanBasicInfo", "captainId"],
            ],
            DASH,
        ),
    ),
    field(
        Guild,
        "ownerNickname",
        Rule::FirstOf(
            &[
                primary!["data", "guildInfo", "owner_basic_info", "nickname"],
                secondary!["player_info", "captainBasicInfo", "nickname"],
            ],
            UNKNOWN,
        ),
    ),
    field(
        Guild,
        "ownerLevel",
        Rule::FirstOf(
            &[
                primary!["data", "guildInfo", "owner_basic_info", "level"],
                secondary!["player_info", "captainBasicInfo", "level"],
            ],
            DASH,
        ),
    ),
    field(
        Guild,
        "ownerLikes",
        Rule::FirstOf(
            &[
                primary!["data", "guildInfo", "owner_basic_info", "likes"],
                secondary!["player_info", "captainBasicInfo", "liked"],
            ],
            DASH,
        ),
    ),
    // captain
    field(
        Captain,
        "nickname",
        Rule::FirstOf(
            &[secondary!["player_info", "captainBasicInfo", "nickname"]],
            UNKNOWN,
        ),
    ),
    field(
        Captain,
        "level",
        Rule::FirstOf(
            &[secondary!["player_info", "captainBasicInfo", "level"]],
            DASH,
        ),
    ),
    field(
        Captain,
        "likes",
        Rule::FirstOf(
            &[secondary!["player_info", "captainBasicInfo", "liked"]],
            DASH,
        ),
    ),
    field(
        Captain,
        "brRankPoints",
        Rule::FirstOf(
            &[
                secondary!["player_info", "captainBasicInfo", "brRankingPoints"],
                secondary!["player_info", "captainBasicInfo", "rankingPoints"],
            ],
            DASH,
        ),
    ),
    field(
        Captain,
        "csRankPoints",
        Rule::FirstOf(
            &[secondary!["player_info", "captainBasicInfo", "csRankingPoints"]],
            DASH,
        ),
    ),
    field(
        Captain,
        "lastLogin",
        Rule::Timestamp {
            readable: None,
            epoch: secondary!["player_info", "captainBasicInfo", "lastLoginAt"],
        },
    ),
    // social
    field(
        Social,
        "gender",
        Rule::FirstOf(&[secondary!["player_info", "socialInfo", "gender"]], DASH),
    ),
    field(
        Social,
        "language",
        Rule::FirstOf(
            &[secondary!["player_info", "socialInfo", "language"]],
            DASH,
        ),
    ),
    field(
        Social,
        "modePrefer",
        Rule::FirstOf(
            &[secondary!["player_info", "socialInfo", "modePrefer"]],
            DASH,
        ),
    ),
    field(
        Social,
        "rankShow",
        Rule::FirstOf(
            &[secondary!["player_info", "socialInfo", "rankShow"]],
            DASH,
        ),
    ),
    field(
        Social,
        "timeActive",
        Rule::FirstOf(
            &[secondary!["player_info", "socialInfo", "timeActive"]],
            DASH,
        ),
    ),
    // weapons
    field(
        Weapons,
        "skins",
        Rule::Joined(secondary!["player_info", "basicInfo", "weaponSkinShows"]),
    ),
];

/// Finds the rule for one canonical field.
pub fn rule_for(section: SectionId, name: &str) -> Option<&'static FieldRule> {
    PROFILE_FIELDS
        .iter()
        .find(|f| f.section == section && f.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn first_candidate(section: SectionId, name: &str) -> Candidate {
        match rule_for(section, name).map(|f| f.rule) {
            Some(Rule::FirstOf(candidates, _)) => candidates[0],
            other => panic!("{}.{} is not a FirstOf rule: {:?}", section.wire_name(), name, other),
        }
    }

    #[test]
    fn test_field_names_are_unique_per_section() {
        let mut seen = HashSet::new();
        for f in PROFILE_FIELDS {
            assert!(
                seen.insert((f.section, f.name)),
                "duplicate rule for {}.{}",
                f.section.wire_name(),
                f.name
            );
        }
    }

    #[test]
    fn test_every_section_has_fields() {
        for id in SectionId::ALL {
            assert!(
                PROFILE_FIELDS.iter().any(|f| f.section == id),
                "no rules for {}",
                id.wire_name()
            );
        }
    }

    #[test]
    fn test_candidates_reference_known_sources_in_priority_order() {
        for f in PROFILE_FIELDS {
            if let Rule::FirstOf(candidates, _) = f.rule {
                assert!(!candidates.is_empty(), "{} has no candidates", f.name);
                let sources: Vec<usize> = candidates.iter().map(|c| c.source).collect();
                let mut sorted = sources.clone();
                sorted.sort();
                assert_eq!(sources, sorted, "{} tries secondary before primary", f.name);
                assert!(sources.iter().all(|s| *s == PRIMARY || *s == SECONDARY));
            }
        }
    }

    #[test]
    fn test_shared_fields_prefer_primary_provider() {
        for (section, name) in [
            (Basic, "nickname"),
            (Basic, "level"),
            (Basic, "region"),
            (Appearance, "avatarId"),
            (BattleStats, "brRankPoints"),
            (Pet, "name"),
            (Guild, "ownerNickname"),
        ] {
            assert_eq!(first_candidate(section, name).source, PRIMARY, "{}", name);
        }
    }

    #[test]
    fn test_placeholders_match_field_kind() {
        let fallback = |section, name| match rule_for(section, name).map(|f| f.rule) {
            Some(Rule::FirstOf(_, fallback)) => fallback,
            other => panic!("unexpected rule {:?}", other),
        };

        assert_eq!(fallback(Basic, "nickname"), UNKNOWN);
        assert_eq!(fallback(Guild, "ownerNickname"), UNKNOWN);
        assert_eq!(fallback(Captain, "nickname"), UNKNOWN);
        assert_eq!(fallback(Pet, "name"), NONE);
        assert_eq!(fallback(Guild, "name"), NONE);
        assert_eq!(fallback(Basic, "signature"), NONE);
        assert_eq!(fallback(Basic, "region"), Fallback::CallerRegion);
        assert_eq!(fallback(Social, "gender"), DASH);
    }

    #[test]
    fn test_timestamp_rules() {
        let timestamps: Vec<&FieldRule> = PROFILE_FIELDS
            .iter()
            .filter(|f| matches!(f.rule, Rule::Timestamp { .. }))
            .collect();
        assert_eq!(timestamps.len(), 3);

        match rule_for(Captain, "lastLogin").map(|f| f.rule) {
            Some(Rule::Timestamp { readable, epoch }) => {
                assert_eq!(readable, None);
                assert_eq!(epoch.source, SECONDARY);
            }
            other => panic!("unexpected rule {:?}", other),
        }
    }

    #[test]
    fn test_presence_markers_cover_both_providers() {
        let sources: Vec<usize> = PRESENCE_MARKERS.iter().map(|c| c.source).collect();
        assert_eq!(sources, vec![PRIMARY, SECONDARY]);
    }
}
