//! Convenience re-exports for downstream users.
//!
//! ```ignore
//! use colloquy_rs::prelude::*;
//! ```

pub use crate::api::retry::RetryPolicy;
pub use crate::api::usage::{CostRates, UsageSummary, UsageTracker};
pub use crate::game::config::SessionConfig;
pub use crate::game::events::{
    CompositeEventHandler, EventHandler, FnEventHandler, LoggingHandler, NoopHandler, SessionEvent,
};
pub use crate::game::puzzle::{Puzzle, RoleSpec, builtin_puzzles, default_cast};
pub use crate::game::scheduler::{TurnScheduler, TurnState};
pub use crate::game::session::{Outcome, Session, SessionReport};
pub use crate::game::transcript::Transcript;
pub use crate::{
    ChatClient, ChatCompletion, ChatFuture, ChatRequest, Gateway, Message, MessageRole, UsageInfo,
};
