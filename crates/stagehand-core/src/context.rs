//! The view of a session a page renderer gets while it runs.

use crate::element::{Element, NoticeLevel};
use crate::error::{RenderError, TargetError};
use crate::identity::{IdentityKeyGenerator, IdentityToken, IssuedKeys};
use crate::navigation::NavigationSelection;
use crate::session::{SessionHandle, SessionInner};
use crate::target::{TargetId, WriteOutcome};
use crate::PassId;

pub struct RenderContext<'a> {
    session: &'a SessionInner,
    selection: &'a NavigationSelection,
    target: &'a TargetId,
    pass: PassId,
    keys: IdentityKeyGenerator,
    issued: &'a mut IssuedKeys,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(
        session: &'a SessionInner,
        selection: &'a NavigationSelection,
        target: &'a TargetId,
        pass: PassId,
        keys: IdentityKeyGenerator,
        issued: &'a mut IssuedKeys,
    ) -> Self {
        Self {
            session,
            selection,
            target,
            pass,
            keys,
            issued,
        }
    }

    pub fn current_selection(&self) -> &NavigationSelection {
        self.selection
    }

    pub fn pass(&self) -> PassId {
        self.pass
    }

    pub fn target(&self) -> &TargetId {
        self.target
    }

    /// Derives the identity token for `base_key` in this renderer's context.
    pub fn request_key(&self, base_key: &str, discriminator: Option<&str>) -> IdentityToken {
        self.keys.derive(base_key, discriminator)
    }

    pub fn owned_state_prefix(&self) -> String {
        self.keys.prefix()
    }

    pub fn emit(&mut self, element: Element) -> Result<WriteOutcome, RenderError> {
        Ok(self.session.write_target(self.target, self.pass, element)?)
    }

    pub fn text(&mut self, text: impl Into<String>) -> Result<WriteOutcome, RenderError> {
        self.emit(Element::text(text))
    }

    pub fn notice(
        &mut self,
        level: NoticeLevel,
        message: impl Into<String>,
    ) -> Result<WriteOutcome, RenderError> {
        self.emit(Element::notice(level, message))
    }

    /// Emits an interactive element. Each token may be issued once per pass.
    pub fn widget(
        &mut self,
        base_key: &str,
        discriminator: Option<&str>,
        label: impl Into<String>,
    ) -> Result<IdentityToken, RenderError> {
        let token = self.request_key(base_key, discriminator);
        if !self.issued.issue(&token) {
            return Err(RenderError::DuplicateIdentity { token });
        }
        self.emit(Element::Widget {
            token: token.clone(),
            label: label.into(),
        })?;
        Ok(token)
    }

    /// Value last delivered to the widget identified by `token`.
    pub fn value<T: Clone + 'static>(&self, token: &IdentityToken) -> Result<Option<T>, RenderError> {
        Ok(self.session.read_state(token.as_str())?)
    }

    pub fn state<T: Clone + 'static>(&self, base_key: &str) -> Result<Option<T>, RenderError> {
        let key = self.request_key(base_key, None);
        Ok(self.session.read_state(key.as_str())?)
    }

    pub fn set_state<T: 'static>(&mut self, base_key: &str, value: T) {
        let key = self.request_key(base_key, None);
        self.session.write_state(key.into(), value);
    }

    /// Returns the stored value for `base_key`, storing `init()` first if absent.
    pub fn remember<T: Clone + 'static>(
        &mut self,
        base_key: &str,
        init: impl FnOnce() -> T,
    ) -> Result<T, RenderError> {
        if let Some(value) = self.state::<T>(base_key)? {
            return Ok(value);
        }
        let value = init();
        self.set_state(base_key, value.clone());
        Ok(value)
    }

    /// Writer that stays usable after the renderer returns. Its writes are
    /// dropped once a later pass takes the target over.
    pub fn writer(&self) -> TargetWriter {
        TargetWriter {
            session: self.session.handle(),
            target: self.target.clone(),
            pass: self.pass,
        }
    }

    pub fn request_rerun(&self) {
        self.session.request_pass();
    }

    pub fn session(&self) -> SessionHandle {
        self.session.handle()
    }
}

/// Deferred write access to one target, pinned to the pass that created it.
#[derive(Clone)]
pub struct TargetWriter {
    session: SessionHandle,
    target: TargetId,
    pass: PassId,
}

impl TargetWriter {
    pub fn target(&self) -> &TargetId {
        &self.target
    }

    pub fn pass(&self) -> PassId {
        self.pass
    }

    pub fn emit(&self, element: Element) -> Result<WriteOutcome, TargetError> {
        match self.session.upgrade() {
            Some(session) => session.write_target(&self.target, self.pass, element),
            None => Ok(WriteOutcome::Detached),
        }
    }

    pub fn text(&self, text: impl Into<String>) -> Result<WriteOutcome, TargetError> {
        self.emit(Element::text(text))
    }
}
