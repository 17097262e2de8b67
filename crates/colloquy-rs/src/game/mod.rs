//! The deduction-game core: session driver, turn scheduling, participants,
//! transcript, puzzles, configuration, and events.
//!
//! Data flow per turn: the [`Session`](session::Session) asks the
//! [`TurnScheduler`](scheduler::TurnScheduler) who speaks, renders the
//! shared [`Transcript`](transcript::Transcript) window, lets the
//! [`Participant`](participant::Participant) act through the gateway,
//! appends the utterance, optionally runs one
//! [`Arbiter`](participant::Arbiter) exchange, and re-evaluates
//! termination. [`SessionEvent`](events::SessionEvent)s narrate the whole
//! run to any attached [`EventHandler`](events::EventHandler).

pub mod config;
pub mod events;
pub mod participant;
pub mod puzzle;
pub mod scheduler;
pub mod session;
pub mod transcript;

pub use config::SessionConfig;
pub use events::{EventHandler, LoggingHandler, NoopHandler, SessionEvent};
pub use participant::{Arbiter, Participant};
pub use puzzle::{Puzzle, RoleSpec, builtin_puzzles, default_cast};
pub use scheduler::{TurnScheduler, TurnState};
pub use session::{Outcome, Session, SessionReport};
pub use transcript::Transcript;
