//! The agent loop: reason, act, observe.
//!
//! 1. **Receive** user input and append it to conversation memory
//! 2. **Build context**: the profile's system prompt plus the history the
//!    profile may see
//! 3. **Generate** with the backend, under a timeout
//! 4. **Parse** the reply into actions ([`parser`])
//! 5. **Dispatch** tool actions and append their observations
//!    ([`dispatcher`]), then loop back to step 2
//! 6. **Answer** as soon as a turn yields an answer action
//!
//! The loop stops at the first answer, at a turn that yields nothing usable,
//! or when the turn bound is reached. Every ending is a [`RunOutcome`].

pub mod dispatcher;
pub mod loop_runner;
pub mod parser;
pub mod prompts;

#[cfg(test)]
mod test_helpers;

pub use dispatcher::{Observation, ToolDispatcher};
pub use loop_runner::{Agent, RunOutcome, RunStatus, DEFAULT_BACKEND_TIMEOUT, DEFAULT_MAX_TURNS};
pub use parser::{parse_response, Action, ParsedResponse};
