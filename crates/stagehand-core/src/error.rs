//! Error types shared across the coordinator.
//!
//! Only [`RenderError`] ever reaches the user (wrapped in a
//! [`RendererFailure`](crate::RendererFailure)); the others are either
//! returned to the host that caused them or absorbed by the coordinator.

use crate::applier::SlotHandle;
use crate::identity::IdentityToken;
use crate::navigation::{PageId, SubPageId};
use crate::target::TargetId;
use crate::PassId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    #[error("slot {handle} missing")]
    Missing { handle: SlotHandle },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("render target `{target}` is already being populated")]
    Reentrant { target: TargetId },
    #[error("render target `{target}` is unknown")]
    Unknown { target: TargetId },
    #[error("pass {pass} cannot populate `{target}`; pass {generation} already owns it")]
    Superseded {
        target: TargetId,
        pass: PassId,
        generation: PassId,
    },
    #[error(transparent)]
    Slot(#[from] SlotError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("state key `{key}` type mismatch; expected {expected}")]
    TypeMismatch { key: String, expected: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("unknown page `{page}`")]
    UnknownPage { page: PageId },
    #[error("page `{page}` has no sub-page `{sub_page}`")]
    UnknownSubPage { page: PageId, sub_page: SubPageId },
    #[error("page `{page}` has no sub-pages")]
    NoSubPages { page: PageId },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid id `{id}`: {reason}")]
    InvalidId { id: String, reason: &'static str },
    #[error("page `{page}` registered twice")]
    DuplicatePage { page: PageId },
    #[error("sub-page `{sub_page}` registered twice under `{page}`")]
    DuplicateSubPage { page: PageId, sub_page: SubPageId },
    #[error("default page `{page}` is not registered")]
    MissingDefault { page: PageId },
    #[error("`{selection}` renders into `{target}`, which is reserved for header or footer")]
    TargetCollision { selection: String, target: TargetId },
}

/// Failure raised by a page renderer, or by the coordinator on its behalf.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("widget identity `{token}` issued twice in one pass")]
    DuplicateIdentity { token: IdentityToken },
    #[error(transparent)]
    Target(#[from] TargetError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error("renderer panicked: {message}")]
    Panicked { message: String },
    #[error("{message}")]
    Failed {
        message: String,
        detail: Option<String>,
    },
}

impl RenderError {
    pub fn failed(message: impl Into<String>) -> Self {
        RenderError::Failed {
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(message: impl Into<String>, detail: impl Into<String>) -> Self {
        RenderError::Failed {
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    /// Diagnostic text shown under the error message, when there is any.
    pub fn detail(&self) -> Option<String> {
        match self {
            RenderError::Failed { detail, .. } => detail.clone(),
            RenderError::Panicked { .. } => {
                Some("the renderer unwound; its partial output was kept".into())
            }
            _ => None,
        }
    }
}
