// 🏃 Candidate Entity - Individuals and teams
//
// A candidate is whoever may enroll in a competition:
// - Individual: one person (name, first name, contact email)
// - Team: a named group
//
// Identity is the candidate's name. Individuals and teams share one
// namespace, so "Falcons" cannot be both a person and a team.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

// ============================================================================
// CANDIDATE KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateKind {
    Individual,
    Team,
}

impl CandidateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateKind::Individual => "individuals",
            CandidateKind::Team => "teams",
        }
    }
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// VARIANTS
// ============================================================================

/// A single person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Family name, also the registry key
    name: String,
    first_name: String,
    email: String,
}

impl Person {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    name: String,
}

impl Team {
    pub fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// CANDIDATE
// ============================================================================

/// Either an individual or a team.
///
/// The key is the name alone: a team's name, an individual's family name.
/// First name and email are not part of it, so two individuals sharing a
/// family name collide and the second one is refused as a duplicate.
///
/// Only the [`Registry`](crate::Registry) builds candidates, so every
/// candidate a caller holds is one the registry knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Candidate {
    Individual(Person),
    Team(Team),
}

impl Candidate {
    pub(crate) fn individual(name: String, first_name: String, email: String) -> Self {
        Candidate::Individual(Person {
            name,
            first_name,
            email,
        })
    }

    pub(crate) fn team(name: String) -> Self {
        Candidate::Team(Team { name })
    }

    /// Registry key
    pub fn name(&self) -> &str {
        match self {
            Candidate::Individual(person) => person.name(),
            Candidate::Team(team) => team.name(),
        }
    }

    pub fn kind(&self) -> CandidateKind {
        match self {
            Candidate::Individual(_) => CandidateKind::Individual,
            Candidate::Team(_) => CandidateKind::Team,
        }
    }

    /// "First Last" for people, the team name otherwise
    pub fn display_name(&self) -> String {
        match self {
            Candidate::Individual(person) if !person.first_name.is_empty() => {
                format!("{} {}", person.first_name, person.name)
            }
            _ => self.name().to_string(),
        }
    }

    pub fn as_person(&self) -> Option<&Person> {
        match self {
            Candidate::Individual(person) => Some(person),
            Candidate::Team(_) => None,
        }
    }

    pub fn as_team(&self) -> Option<&Team> {
        match self {
            Candidate::Team(team) => Some(team),
            Candidate::Individual(_) => None,
        }
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name().cmp(other.name())
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// TESTS
// ============================================================================
