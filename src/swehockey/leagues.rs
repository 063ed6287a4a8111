// src/swehockey/leagues.rs
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Regular,
    Playoff,
    Qualification,
}

/// A league/season as identified by stats.swehockey.se
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct League {
    pub id: u32,
    pub name: &'static str,
    pub season: &'static str, // e.g. "20132014"
    pub phase: Phase,
}

const fn league(id: u32, name: &'static str, season: &'static str, phase: Phase) -> League {
    League { id, name, season, phase }
}

// Informational only; any id the site knows can be fetched.
pub static LEAGUES: &[League] = &[
    league(3905, "SHL", "20132014", Phase::Regular),
    league(3906, "Hockeyallsvenskan", "20132014", Phase::Regular),
    league(3928, "Allettan Mellan", "20132014", Phase::Regular),
    league(3929, "Allettan Södra", "20132014", Phase::Regular),
    league(3882, "Division 1 Norra", "20132014", Phase::Regular),
    league(3878, "Division 1 C", "20132014", Phase::Regular),
    league(3930, "Division 1 C Forts.", "20132014", Phase::Regular),
    league(2892, "Elitserien", "20122013", Phase::Regular),
    league(3810, "SM-slutspel", "20122013", Phase::Playoff),
    league(3811, "Kval till Elitserien", "20122013", Phase::Qualification),
];

pub fn lookup(id: u32) -> Option<&'static League> {
    LEAGUES.iter().find(|l| l.id == id)
}

/// All known leagues, ordered by id.
pub fn all() -> Vec<&'static League> {
    let mut leagues: Vec<_> = LEAGUES.iter().collect();
    leagues.sort_by_key(|l| l.id);
    leagues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let shl = lookup(3905).unwrap();
        assert_eq!(shl.name, "SHL");
        assert_eq!(shl.season, "20132014");
        assert_eq!(lookup(3810).unwrap().phase, Phase::Playoff);
        assert!(lookup(1).is_none());
    }

    #[test]
    fn test_all_sorted_and_unique() {
        let ids: Vec<u32> = all().iter().map(|l| l.id).collect();
        assert_eq!(ids.len(), LEAGUES.len());
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_serializes_phase_lowercase() {
        let json = serde_json::to_value(lookup(3811).unwrap()).unwrap();
        assert_eq!(json["phase"], "qualification");
        assert_eq!(json["name"], "Kval till Elitserien");
    }
}
