//! Collaborators the normalizer consults for owner identity

use std::collections::HashMap;

/// Knows which owners belong to the league
pub trait RosterRegistry {
    /// Canonical spelling of an owner id, if the owner is known
    fn canonical_owner(&self, owner: &str) -> Option<String>;

    /// Division tag the owner is registered under
    fn division_of(&self, owner: &str) -> Option<String>;
}

/// Maps owner ids to team display names
pub trait TeamNameLookup {
    fn team_name(&self, owner: &str) -> Option<String>;
}

/// Simple in-memory roster, handy for tests and one-off payloads
#[derive(Debug, Clone, Default)]
pub struct InMemoryRoster {
    // lower-cased owner -> (owner, division, team name)
    entries: HashMap<String, (String, Option<String>, Option<String>)>,
}

impl InMemoryRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_owner(mut self, owner: &str, division: Option<&str>, team: Option<&str>) -> Self {
        self.entries.insert(
            owner.to_lowercase(),
            (owner.to_string(), division.map(str::to_string), team.map(str::to_string)),
        );
        self
    }
}

impl RosterRegistry for InMemoryRoster {
    fn canonical_owner(&self, owner: &str) -> Option<String> {
        self.entries.get(&owner.trim().to_lowercase()).map(|(o, _, _)| o.clone())
    }

    fn division_of(&self, owner: &str) -> Option<String> {
        self.entries.get(&owner.trim().to_lowercase()).and_then(|(_, d, _)| d.clone())
    }
}

impl TeamNameLookup for InMemoryRoster {
    fn team_name(&self, owner: &str) -> Option<String> {
        self.entries.get(&owner.trim().to_lowercase()).and_then(|(_, _, t)| t.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let roster = InMemoryRoster::new()
            .with_owner("Healzy", Some("BTK"), Some("healzyswarriors"))
            .with_owner("Coops", Some("FLO"), None);

        assert_eq!(roster.canonical_owner("healzy"), Some("Healzy".to_string()));
        assert_eq!(roster.division_of("COOPS"), Some("FLO".to_string()));
        assert_eq!(roster.team_name("Healzy"), Some("healzyswarriors".to_string()));
        assert_eq!(roster.team_name("Coops"), None);
        assert_eq!(roster.canonical_owner("Nobody"), None);
    }
}
