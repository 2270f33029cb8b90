//! Session-scoped navigation state.
//!
//! [`NavigationStateStore`] is the single source of truth for the selected
//! page. Every structural change is recorded as a pending
//! [`NavigationChange`] which the coordinator consumes at the start of the
//! next pass; that is the only path through which render targets are
//! invalidated and page state is scheduled for cleanup.

use std::fmt;

use crate::identity;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            #[inline]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identifier of a top-level page.
    PageId
);
string_id!(
    /// Identifier of a sub-page, unique within its page.
    SubPageId
);

/// The page (and optional sub-page) currently chosen by the user.
///
/// Equality is structural; two selections naming the same page and sub-page
/// are the same selection no matter where they were built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NavigationSelection {
    pub page_id: PageId,
    pub sub_page_id: Option<SubPageId>,
}

impl NavigationSelection {
    pub fn page(page_id: impl Into<PageId>) -> Self {
        Self {
            page_id: page_id.into(),
            sub_page_id: None,
        }
    }

    pub fn with_sub_page(mut self, sub_page_id: impl Into<SubPageId>) -> Self {
        self.sub_page_id = Some(sub_page_id.into());
        self
    }

    /// Identity context of the selection: `page` or `page/sub-page`.
    pub fn context(&self) -> String {
        match &self.sub_page_id {
            Some(sub) => format!("{}/{}", self.page_id, sub),
            None => self.page_id.to_string(),
        }
    }

    /// Prefix shared by every state key the selected page owns.
    pub fn owned_state_prefix(&self) -> String {
        identity::context_prefix(&self.context())
    }
}

impl fmt::Display for NavigationSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.context())
    }
}

/// Selections left behind since the coordinator last looked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationChange {
    /// Previously active selections, oldest first, never containing `current`.
    pub departed: Vec<NavigationSelection>,
    pub current: NavigationSelection,
}

#[derive(Debug)]
pub struct NavigationStateStore {
    default_page: PageId,
    selection: Option<NavigationSelection>,
    pending: Option<NavigationChange>,
    changes: u64,
}

impl NavigationStateStore {
    pub fn new(default_page: impl Into<PageId>) -> Self {
        Self {
            default_page: default_page.into(),
            selection: None,
            pending: None,
            changes: 0,
        }
    }

    /// Returns the current selection, falling back to the default page the
    /// first time it is read.
    pub fn selection(&mut self) -> NavigationSelection {
        let default_page = &self.default_page;
        self.selection
            .get_or_insert_with(|| NavigationSelection::page(default_page.clone()))
            .clone()
    }

    /// Current selection without initializing it.
    pub fn peek(&self) -> Option<&NavigationSelection> {
        self.selection.as_ref()
    }

    /// Commits `next` if it differs structurally from the stored selection.
    ///
    /// Returns `true` only when the value changed; repeating the current
    /// selection is a no-op.
    pub fn set_selection(&mut self, next: NavigationSelection) -> bool {
        let previous = self.selection();
        if previous == next {
            return false;
        }
        let pending = self.pending.get_or_insert_with(|| NavigationChange {
            departed: Vec::new(),
            current: next.clone(),
        });
        if !pending.departed.contains(&previous) {
            pending.departed.push(previous);
        }
        pending.departed.retain(|selection| *selection != next);
        pending.current = next.clone();
        self.selection = Some(next);
        self.changes += 1;
        true
    }

    /// Hands the accumulated change to the caller, leaving none pending.
    pub fn take_change(&mut self) -> Option<NavigationChange> {
        self.pending.take()
    }

    pub fn has_pending_change(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of committed changes over the life of the session.
    pub fn change_count(&self) -> u64 {
        self.changes
    }
}

#[cfg(test)]
#[path = "tests/navigation_tests.rs"]
mod tests;
