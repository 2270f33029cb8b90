#![doc = r"Session-scoped navigation, render identity and render-target coordination."]

pub mod applier;
pub mod cleanup;
pub mod collections;
pub mod context;
pub mod coordinator;
pub mod element;
pub mod error;
pub mod hash;
pub mod identity;
pub mod navigation;
pub mod page;
pub mod platform;
pub mod session;
pub mod state;
pub mod target;

pub use applier::{MemorySlotApplier, SlotApplier, SlotHandle};
pub use cleanup::{CleanupPhase, CleanupReport, CleanupScheduler};
pub use context::{RenderContext, TargetWriter};
pub use coordinator::{
    CoordinatorPhase, PassOutcome, PassReport, RendererFailure, SkipReason,
};
pub use element::{Element, NoticeLevel};
pub use error::{
    NavigationError, RegistryError, RenderError, SlotError, StateError, TargetError,
};
pub use identity::{IdentityKeyGenerator, IdentityToken, IssuedKeys};
pub use navigation::{
    NavigationChange, NavigationSelection, NavigationStateStore, PageId, SubPageId,
};
pub use page::{page_fn, FnPage, PageEntry, PageRegistry, PageRenderer, Route, SubPageEntry};
pub use platform::{DefaultScheduler, PassScheduler};
pub use session::{Session, SessionConfig, SessionDebugInfo, SessionHandle};
pub use state::SessionState;
pub use target::{KeepSet, RenderTarget, RenderTargetCache, TargetId, TargetScope, WriteOutcome};

pub type Key = u64;
/// Monotonic pass counter of one session, starting at 1.
pub type PassId = u64;
