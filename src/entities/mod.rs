// Entity Models
//
// Competitions and candidates are plain values keyed by name.
// The registry owns them and records who is enrolled where.

pub mod candidate;
pub mod competition;

pub use candidate::{Candidate, CandidateKind, Person, Team};
pub use competition::{today, Competition};
