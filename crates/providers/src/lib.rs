//! Text-generation backends for Clawlet.
//!
//! All backends implement the `clawlet_core::Provider` trait.
//! [`build_from_config`] picks one based on configuration.

pub mod mock;
pub mod openai_compat;
pub mod router;

pub use mock::MockProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use router::{build_from_config, ProviderRouter};
