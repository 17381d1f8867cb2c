// 📋 Registry - Catalog of competitions and candidates
//
// The registry owns every competition and candidate, keyed by name.
// Enrollments are edges (competition, candidate) in one ordered set:
// - "who is in Relay?"   → range scan on the competition name
// - "where is Durand?"   → filter on the candidate name
// There is exactly one record per enrollment, so both ends always agree.
//
// Every creation and removal is mirrored to the injected store first; the
// catalog only changes once the store has accepted.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, info};

use crate::config::{ModeCheck, RegistryConfig};
use crate::entities::{today, Candidate, Competition};
use crate::error::{RegistryError, Result};
use crate::store::{NullStore, Store};

/// (competition name, candidate name)
type Edge = (String, String);

#[derive(Debug)]
pub struct Registry {
    competitions: BTreeMap<String, Competition>,
    candidates: BTreeMap<String, Candidate>,
    enrollments: BTreeSet<Edge>,
    store: Box<dyn Store>,
    config: RegistryConfig,
}

impl Registry {
    pub fn new(store: Box<dyn Store>, config: RegistryConfig) -> Self {
        Registry {
            competitions: BTreeMap::new(),
            candidates: BTreeMap::new(),
            enrollments: BTreeSet::new(),
            store,
            config,
        }
    }

    /// Registry without an external store, default configuration
    pub fn in_memory() -> Self {
        Self::new(Box::new(NullStore), RegistryConfig::default())
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // ========================================================================
    // FACTORIES
    // ========================================================================

    /// Create a competition. The only way to obtain one.
    pub fn create_competition(
        &mut self,
        name: &str,
        closing_date: Option<NaiveDate>,
        team_only: bool,
    ) -> Result<&Competition> {
        if self.competitions.contains_key(name) {
            return Err(RegistryError::DuplicateKey(name.to_string()));
        }

        self.store
            .add_competition(name, closing_date, team_only)
            .map_err(RegistryError::Store)?;

        info!(competition = name, ?closing_date, team_only, "competition created");

        let competition = Competition::new(name.to_string(), closing_date, team_only);
        Ok(&*self
            .competitions
            .entry(name.to_string())
            .or_insert(competition))
    }

    /// Create an individual candidate, keyed by `name`
    pub fn create_individual(
        &mut self,
        name: &str,
        first_name: &str,
        email: &str,
    ) -> Result<&Candidate> {
        self.ensure_candidate_free(name)?;

        self.store
            .add_individual(name, first_name, email)
            .map_err(RegistryError::Store)?;

        info!(candidate = name, "individual created");

        let candidate =
            Candidate::individual(name.to_string(), first_name.to_string(), email.to_string());
        Ok(&*self.candidates.entry(name.to_string()).or_insert(candidate))
    }

    pub fn create_team(&mut self, name: &str) -> Result<&Candidate> {
        self.ensure_candidate_free(name)?;

        self.store.add_team(name).map_err(RegistryError::Store)?;

        info!(candidate = name, "team created");

        let candidate = Candidate::team(name.to_string());
        Ok(&*self.candidates.entry(name.to_string()).or_insert(candidate))
    }

    fn ensure_candidate_free(&self, name: &str) -> Result<()> {
        if self.candidates.contains_key(name) {
            return Err(RegistryError::DuplicateKey(name.to_string()));
        }
        Ok(())
    }

    // ========================================================================
    // REMOVAL
    // ========================================================================

    /// Remove a competition: notify the store, then withdraw everyone and
    /// drop it from the catalog.
    pub fn remove_competition(&mut self, name: &str) -> Result<Competition> {
        if !self.competitions.contains_key(name) {
            return Err(RegistryError::CompetitionNotFound(name.to_string()));
        }

        self.store
            .remove_competition(name)
            .map_err(RegistryError::Store)?;

        self.delete_competition(name)
    }

    /// Remove a candidate: notify the store, then withdraw it from every
    /// competition and drop it from the catalog.
    pub fn remove_candidate(&mut self, name: &str) -> Result<Candidate> {
        if !self.candidates.contains_key(name) {
            return Err(RegistryError::CandidateNotFound(name.to_string()));
        }

        self.store
            .remove_candidate(name)
            .map_err(RegistryError::Store)?;

        self.delete_candidate(name)
    }

    /// Delete a competition without telling the store.
    ///
    /// Every enrolled candidate is withdrawn first.
    pub fn delete_competition(&mut self, name: &str) -> Result<Competition> {
        let competition = self
            .competitions
            .remove(name)
            .ok_or_else(|| RegistryError::CompetitionNotFound(name.to_string()))?;

        let enrolled: Vec<Edge> = self.edges_of_competition(name).cloned().collect();
        for edge in &enrolled {
            self.enrollments.remove(edge);
        }

        info!(
            competition = name,
            withdrawn = enrolled.len(),
            "competition deleted"
        );
        Ok(competition)
    }

    /// Delete a candidate without telling the store.
    ///
    /// The candidate is withdrawn from every competition first.
    pub fn delete_candidate(&mut self, name: &str) -> Result<Candidate> {
        let candidate = self
            .candidates
            .remove(name)
            .ok_or_else(|| RegistryError::CandidateNotFound(name.to_string()))?;

        let before = self.enrollments.len();
        self.enrollments.retain(|(_, c)| c != name);

        info!(
            candidate = name,
            withdrawn = before - self.enrollments.len(),
            "candidate deleted"
        );
        Ok(candidate)
    }

    // ========================================================================
    // ENROLLMENT
    // ========================================================================

    /// Enroll a candidate in a competition, as of today.
    ///
    /// Returns `false` when the candidate was already enrolled.
    pub fn enroll(&mut self, competition: &str, candidate: &str) -> Result<bool> {
        self.enroll_at(competition, candidate, today())
    }

    /// Enroll a candidate in a competition as of `today`.
    ///
    /// The candidate kind is checked against the competition mode:
    /// - `ModeCheck::Always`: on every call
    /// - `ModeCheck::BeforeDeadline`: only while a closing date is set and
    ///   `today` is strictly before it
    pub fn enroll_at(&mut self, competition: &str, candidate: &str, today: NaiveDate) -> Result<bool> {
        let comp = self
            .competitions
            .get(competition)
            .ok_or_else(|| RegistryError::CompetitionNotFound(competition.to_string()))?;
        let cand = self
            .candidates
            .get(candidate)
            .ok_or_else(|| RegistryError::CandidateNotFound(candidate.to_string()))?;

        let check_mode = match self.config.mode_check {
            ModeCheck::Always => true,
            ModeCheck::BeforeDeadline => comp.is_before_deadline(today),
        };

        if check_mode && !comp.accepts(cand.kind()) {
            return Err(RegistryError::ModeMismatch {
                competition: competition.to_string(),
                candidate: candidate.to_string(),
                required: comp.required_kind(),
            });
        }

        let added = self
            .enrollments
            .insert((competition.to_string(), candidate.to_string()));

        debug!(competition, candidate, added, "enroll");
        Ok(added)
    }

    /// Withdraw a candidate from a competition.
    ///
    /// Returns `false` when the candidate was not enrolled.
    pub fn withdraw(&mut self, competition: &str, candidate: &str) -> Result<bool> {
        if !self.competitions.contains_key(competition) {
            return Err(RegistryError::CompetitionNotFound(competition.to_string()));
        }
        if !self.candidates.contains_key(candidate) {
            return Err(RegistryError::CandidateNotFound(candidate.to_string()));
        }

        let removed = self
            .enrollments
            .remove(&(competition.to_string(), candidate.to_string()));

        debug!(competition, candidate, removed, "withdraw");
        Ok(removed)
    }

    /// Push back a competition's closing date
    pub fn set_closing_date(&mut self, competition: &str, closing_date: NaiveDate) -> Result<()> {
        let comp = self
            .competitions
            .get_mut(competition)
            .ok_or_else(|| RegistryError::CompetitionNotFound(competition.to_string()))?;

        comp.set_closing_date(closing_date)?;

        info!(competition, %closing_date, "closing date moved");
        Ok(())
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn competition(&self, name: &str) -> Option<&Competition> {
        self.competitions.get(name)
    }

    pub fn candidate(&self, name: &str) -> Option<&Candidate> {
        self.candidates.get(name)
    }

    /// All competitions, ordered by name
    pub fn competitions(&self) -> impl Iterator<Item = &Competition> {
        self.competitions.values()
    }

    /// All candidates (individuals and teams), ordered by name
    pub fn candidates(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.values()
    }

    /// Candidates enrolled in a competition, ordered by name
    pub fn candidates_of(&self, competition: &str) -> Vec<&Candidate> {
        self.edges_of_competition(competition)
            .filter_map(|(_, candidate)| self.candidates.get(candidate))
            .collect()
    }

    /// Competitions a candidate is enrolled in, ordered by name
    pub fn competitions_of(&self, candidate: &str) -> Vec<&Competition> {
        self.enrollments
            .iter()
            .filter(|(_, c)| c == candidate)
            .filter_map(|(competition, _)| self.competitions.get(competition))
            .collect()
    }

    pub fn is_enrolled(&self, competition: &str, candidate: &str) -> bool {
        self.enrollments
            .contains(&(competition.to_string(), candidate.to_string()))
    }

    pub fn enrollment_count(&self) -> usize {
        self.enrollments.len()
    }

    /// Enrollment edges, ordered by competition then candidate
    pub fn enrollments(&self) -> impl Iterator<Item = (&str, &str)> {
        self.enrollments
            .iter()
            .map(|(competition, candidate)| (competition.as_str(), candidate.as_str()))
    }

    fn edges_of_competition<'a>(&'a self, competition: &str) -> impl Iterator<Item = &'a Edge> + 'a {
        let start = (competition.to_string(), String::new());
        let name = competition.to_string();
        self.enrollments
            .range(start..)
            .take_while(move |(c, _)| *c == name)
    }

    // ========================================================================
    // RESTORE
    // ========================================================================

    /// Replace the catalog with already persisted parts, without touching
    /// the store. Nothing changes unless every key is unique and every edge
    /// points at a known competition and candidate.
    pub(crate) fn restore(
        &mut self,
        competitions: Vec<Competition>,
        candidates: Vec<Candidate>,
        enrollments: Vec<Edge>,
    ) -> Result<()> {
        let mut competition_map = BTreeMap::new();
        for competition in competitions {
            let name = competition.name().to_string();
            if competition_map.insert(name.clone(), competition).is_some() {
                return Err(RegistryError::DuplicateKey(name));
            }
        }

        let mut candidate_map = BTreeMap::new();
        for candidate in candidates {
            let name = candidate.name().to_string();
            if candidate_map.insert(name.clone(), candidate).is_some() {
                return Err(RegistryError::DuplicateKey(name));
            }
        }

        let mut edges = BTreeSet::new();
        for (competition, candidate) in enrollments {
            if !competition_map.contains_key(&competition) {
                return Err(RegistryError::CompetitionNotFound(competition));
            }
            if !candidate_map.contains_key(&candidate) {
                return Err(RegistryError::CandidateNotFound(candidate));
            }
            edges.insert((competition, candidate));
        }

        self.competitions = competition_map;
        self.candidates = candidate_map;
        self.enrollments = edges;
        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let candidates: Vec<&str> = self.candidates.keys().map(String::as_str).collect();
        let competitions: Vec<&str> = self.competitions.keys().map(String::as_str).collect();

        writeln!(f, "Candidates: [{}]", candidates.join(", "))?;
        write!(f, "Competitions: [{}]", competitions.join(", "))
    }
}

// ============================================================================
// TESTS
// ============================================================================
