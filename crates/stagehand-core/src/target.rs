//! Render-target bookkeeping.
//!
//! The [`RenderTargetCache`] maps logical container names to host slots. A
//! target is created lazily on first reference and lives for the rest of the
//! session; navigation only ever clears it. Each target remembers the pass
//! that last owned it, so writes issued by an older pass are dropped instead
//! of landing on top of newer content.

use std::fmt;

use indexmap::IndexMap;

use crate::applier::{SlotApplier, SlotHandle};
use crate::collections::map::HashSet;
use crate::element::Element;
use crate::error::TargetError;
use crate::navigation::NavigationSelection;
use crate::PassId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(String);

impl TargetId {
    pub const HEADER: &'static str = "header";
    pub const FOOTER: &'static str = "footer";

    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn header() -> Self {
        Self::new(Self::HEADER)
    }

    pub fn footer() -> Self {
        Self::new(Self::FOOTER)
    }

    /// Default main-content target of a selection.
    pub fn for_selection(selection: &NavigationSelection) -> Self {
        Self(format!("main:{}", selection.context()))
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

pub type KeepSet = HashSet<TargetId>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTarget {
    id: TargetId,
    slot: SlotHandle,
    populated: bool,
    populating: bool,
    generation: PassId,
}

impl RenderTarget {
    fn new(id: TargetId, slot: SlotHandle, generation: PassId) -> Self {
        Self {
            id,
            slot,
            populated: false,
            populating: false,
            generation,
        }
    }

    pub fn id(&self) -> &TargetId {
        &self.id
    }

    pub fn slot(&self) -> SlotHandle {
        self.slot
    }

    pub fn populated(&self) -> bool {
        self.populated
    }

    pub fn is_populating(&self) -> bool {
        self.populating
    }

    /// Pass that last populated or cleared this target.
    pub fn generation(&self) -> PassId {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    /// The writer's pass was superseded; the element was dropped.
    Stale { generation: PassId },
    /// The owning session no longer exists.
    Detached,
}

pub struct RenderTargetCache {
    applier: Box<dyn SlotApplier>,
    targets: IndexMap<TargetId, RenderTarget>,
    latest_pass: PassId,
}

impl fmt::Debug for RenderTargetCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderTargetCache")
            .field("targets", &self.targets)
            .field("latest_pass", &self.latest_pass)
            .finish()
    }
}

impl RenderTargetCache {
    pub fn new(applier: impl SlotApplier + 'static) -> Self {
        Self {
            applier: Box::new(applier),
            targets: IndexMap::new(),
            latest_pass: 0,
        }
    }

    /// Records that `pass` has started. Clearing a target stamps it with the
    /// latest pass, which invalidates writers held from earlier passes.
    pub fn advance(&mut self, pass: PassId) {
        self.latest_pass = self.latest_pass.max(pass);
    }

    pub fn latest_pass(&self) -> PassId {
        self.latest_pass
    }

    fn entry(&mut self, id: &TargetId) -> &mut RenderTarget {
        let Self {
            applier,
            targets,
            latest_pass,
        } = self;
        targets.entry(id.clone()).or_insert_with(|| {
            log::trace!("creating render target `{id}`");
            let slot = applier.create_slot(id);
            RenderTarget::new(id.clone(), slot, *latest_pass)
        })
    }

    pub fn get_or_create(&mut self, id: &TargetId) -> &RenderTarget {
        self.entry(id)
    }

    pub fn get(&self, id: &TargetId) -> Option<&RenderTarget> {
        self.targets.get(id)
    }

    pub fn targets(&self) -> impl Iterator<Item = &RenderTarget> {
        self.targets.values()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Empties a target's slot while keeping the handle. Unknown ids are a no-op.
    pub fn clear(&mut self, id: &TargetId) -> Result<(), TargetError> {
        let latest_pass = self.latest_pass;
        let Some(target) = self.targets.get_mut(id) else {
            return Ok(());
        };
        self.applier.clear_slot(target.slot)?;
        target.populated = false;
        target.generation = target.generation.max(latest_pass);
        Ok(())
    }

    /// Clears every known target outside `keep` and returns the ids it cleared.
    ///
    /// Every target is attempted even if one fails; the first failure is returned.
    pub fn clear_all_except(&mut self, keep: &KeepSet) -> Result<Vec<TargetId>, TargetError> {
        let doomed: Vec<TargetId> = self
            .targets
            .keys()
            .filter(|id| !keep.contains(*id))
            .cloned()
            .collect();
        let mut first_error = None;
        let mut cleared = Vec::with_capacity(doomed.len());
        for id in doomed {
            match self.clear(&id) {
                Ok(()) => cleared.push(id),
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(cleared),
        }
    }

    /// Claims `id` for `pass` and empties it, ready to be repopulated.
    pub fn begin(&mut self, id: &TargetId, pass: PassId) -> Result<(), TargetError> {
        self.advance(pass);
        let Self {
            applier, targets, ..
        } = self;
        let target = targets.entry(id.clone()).or_insert_with(|| {
            let slot = applier.create_slot(id);
            RenderTarget::new(id.clone(), slot, pass)
        });
        if target.populating {
            return Err(TargetError::Reentrant { target: id.clone() });
        }
        if pass < target.generation {
            return Err(TargetError::Superseded {
                target: id.clone(),
                pass,
                generation: target.generation,
            });
        }
        applier.clear_slot(target.slot)?;
        target.populating = true;
        target.populated = false;
        target.generation = pass;
        Ok(())
    }

    /// Appends `element` on behalf of `pass`, unless a newer pass owns the target.
    pub fn write(
        &mut self,
        id: &TargetId,
        pass: PassId,
        element: Element,
    ) -> Result<WriteOutcome, TargetError> {
        let target = self
            .targets
            .get_mut(id)
            .ok_or_else(|| TargetError::Unknown { target: id.clone() })?;
        if pass < target.generation {
            log::debug!(
                "dropping stale write to `{id}` from pass {pass}; pass {} owns it",
                target.generation
            );
            return Ok(WriteOutcome::Stale {
                generation: target.generation,
            });
        }
        self.applier.append(target.slot, element)?;
        target.populated = true;
        Ok(WriteOutcome::Applied)
    }

    /// Ends population started by [`begin`](Self::begin).
    pub fn finish(&mut self, id: &TargetId) {
        if let Some(target) = self.targets.get_mut(id) {
            target.populating = false;
            target.populated = true;
        }
    }

    /// Ends population without marking the target populated.
    fn release(&mut self, id: &TargetId) {
        if let Some(target) = self.targets.get_mut(id) {
            target.populating = false;
        }
    }

    /// Drops every in-progress population flag. Used when a pass unwinds.
    pub fn release_all(&mut self) {
        for target in self.targets.values_mut() {
            target.populating = false;
        }
    }

    /// Clears then repopulates `id` by running `render` against it.
    ///
    /// The target is released even if `render` unwinds. A failed claim leaves
    /// the target untouched.
    pub fn render_into<R>(
        &mut self,
        id: &TargetId,
        pass: PassId,
        render: impl FnOnce(&mut TargetScope<'_>) -> R,
    ) -> Result<R, TargetError> {
        self.begin(id, pass)?;
        let result = {
            let mut scope = TargetScope {
                cache: &mut *self,
                id: id.clone(),
                pass,
            };
            render(&mut scope)
        };
        self.finish(id);
        Ok(result)
    }
}

/// Write access to one target while [`RenderTargetCache::render_into`] runs.
pub struct TargetScope<'a> {
    cache: &'a mut RenderTargetCache,
    id: TargetId,
    pass: PassId,
}

impl Drop for TargetScope<'_> {
    fn drop(&mut self) {
        self.cache.release(&self.id);
    }
}

impl TargetScope<'_> {
    pub fn id(&self) -> &TargetId {
        &self.id
    }

    pub fn pass(&self) -> PassId {
        self.pass
    }

    pub fn emit(&mut self, element: Element) -> Result<WriteOutcome, TargetError> {
        self.cache.write(&self.id, self.pass, element)
    }

    pub fn cache(&mut self) -> &mut RenderTargetCache {
        self.cache
    }
}

#[cfg(test)]
#[path = "tests/target_tests.rs"]
mod tests;
