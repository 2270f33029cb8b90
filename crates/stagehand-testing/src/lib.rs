//! Testing utilities and harness for Stagehand sessions

pub mod testing;

// Re-export testing utilities
pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
    pub use stagehand_core::{
        NavigationSelection, PassOutcome, PassReport, RenderError, SkipReason, TargetId,
    };
}
