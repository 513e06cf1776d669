//! Interaction module - client contact records and their critiques.

mod kind;
mod record;
mod reflection;

pub use kind::InteractionType;
pub use record::Interaction;
pub use reflection::{
    AiReflection, CriticalScore, FALLBACK_CRITIQUE_ACTION, FALLBACK_CRITIQUE_MISTAKES,
};
