//! Page catalog and renderer registration.
//!
//! Pages are registered once, when the host starts, and the resulting
//! [`PageRegistry`] is shared read-only between every session.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::context::RenderContext;
use crate::error::{NavigationError, RegistryError, RenderError};
use crate::navigation::{NavigationSelection, PageId, SubPageId};
use crate::target::TargetId;

/// Prefix reserved for the key contexts of header and footer renderers.
pub const CHROME_CONTEXT_PREFIX: char = '~';

pub trait PageRenderer: Send + Sync {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<(), RenderError>;
}

/// Adapts a closure into a [`PageRenderer`]. Build it with [`page_fn`].
pub struct FnPage<F>(F);

impl<F> PageRenderer for FnPage<F>
where
    F: Fn(&mut RenderContext<'_>) -> Result<(), RenderError> + Send + Sync,
{
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<(), RenderError> {
        (self.0)(ctx)
    }
}

pub fn page_fn<F>(render: F) -> FnPage<F>
where
    F: Fn(&mut RenderContext<'_>) -> Result<(), RenderError> + Send + Sync,
{
    FnPage(render)
}

type SharedRenderer = Arc<dyn PageRenderer>;

#[derive(Clone)]
pub struct SubPageEntry {
    id: SubPageId,
    title: String,
    renderer: Option<SharedRenderer>,
    target: Option<TargetId>,
}

impl SubPageEntry {
    pub fn new(id: impl Into<SubPageId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            renderer: None,
            target: None,
        }
    }

    pub fn renderer(mut self, renderer: impl PageRenderer + 'static) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    /// Renders into `target` instead of the selection's default target.
    pub fn target(mut self, target: impl Into<TargetId>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn id(&self) -> &SubPageId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_under_construction(&self) -> bool {
        self.renderer.is_none()
    }
}

impl fmt::Debug for SubPageEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubPageEntry")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("has_renderer", &self.renderer.is_some())
            .field("target", &self.target)
            .finish()
    }
}

#[derive(Clone)]
pub struct PageEntry {
    id: PageId,
    title: String,
    renderer: Option<SharedRenderer>,
    sub_pages: Vec<SubPageEntry>,
    target: Option<TargetId>,
}

impl PageEntry {
    pub fn new(id: impl Into<PageId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            renderer: None,
            sub_pages: Vec::new(),
            target: None,
        }
    }

    /// Renderer used when no sub-page is selected.
    pub fn renderer(mut self, renderer: impl PageRenderer + 'static) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    pub fn sub_page(mut self, sub_page: SubPageEntry) -> Self {
        self.sub_pages.push(sub_page);
        self
    }

    pub fn target(mut self, target: impl Into<TargetId>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn id(&self) -> &PageId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn sub_pages(&self) -> &[SubPageEntry] {
        &self.sub_pages
    }

    pub fn find_sub_page(&self, id: &SubPageId) -> Option<&SubPageEntry> {
        self.sub_pages.iter().find(|sub_page| sub_page.id == *id)
    }
}

impl fmt::Debug for PageEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageEntry")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("has_renderer", &self.renderer.is_some())
            .field("sub_pages", &self.sub_pages)
            .field("target", &self.target)
            .finish()
    }
}

/// What the coordinator should put into a selection's target.
pub enum Route<'a> {
    Renderer(&'a dyn PageRenderer),
    UnderConstruction {
        title: &'a str,
    },
    /// The page only has sub-pages and none is selected.
    AwaitingSubPage {
        title: &'a str,
        sub_pages: Vec<&'a str>,
    },
}

impl fmt::Debug for Route<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Renderer(_) => f.write_str("Renderer"),
            Route::UnderConstruction { title } => f
                .debug_struct("UnderConstruction")
                .field("title", title)
                .finish(),
            Route::AwaitingSubPage { title, sub_pages } => f
                .debug_struct("AwaitingSubPage")
                .field("title", title)
                .field("sub_pages", sub_pages)
                .finish(),
        }
    }
}

#[derive(Default)]
pub struct PageRegistry {
    pages: IndexMap<PageId, PageEntry>,
    header: Option<SharedRenderer>,
    footer: Option<SharedRenderer>,
}

impl fmt::Debug for PageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageRegistry")
            .field("pages", &self.pages.values().collect::<Vec<_>>())
            .field("header", &self.header.is_some())
            .field("footer", &self.footer.is_some())
            .finish()
    }
}

impl PageRegistry {
    pub fn builder() -> PageRegistryBuilder {
        PageRegistryBuilder::default()
    }

    pub fn page(&self, id: &PageId) -> Option<&PageEntry> {
        self.pages.get(id)
    }

    /// Pages in registration order.
    pub fn pages(&self) -> impl Iterator<Item = &PageEntry> {
        self.pages.values()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn header(&self) -> Option<&dyn PageRenderer> {
        self.header.as_deref()
    }

    pub fn footer(&self) -> Option<&dyn PageRenderer> {
        self.footer.as_deref()
    }

    pub fn ensure_page(&self, id: &PageId) -> Result<(), RegistryError> {
        if self.pages.contains_key(id) {
            Ok(())
        } else {
            Err(RegistryError::MissingDefault { page: id.clone() })
        }
    }

    fn lookup<'a>(
        &'a self,
        selection: &NavigationSelection,
    ) -> Result<(&'a PageEntry, Option<&'a SubPageEntry>), NavigationError> {
        let page = self
            .pages
            .get(&selection.page_id)
            .ok_or_else(|| NavigationError::UnknownPage {
                page: selection.page_id.clone(),
            })?;
        let Some(sub_page_id) = &selection.sub_page_id else {
            return Ok((page, None));
        };
        if page.sub_pages.is_empty() {
            return Err(NavigationError::NoSubPages {
                page: page.id.clone(),
            });
        }
        let sub_page = page
            .find_sub_page(sub_page_id)
            .ok_or_else(|| NavigationError::UnknownSubPage {
                page: page.id.clone(),
                sub_page: sub_page_id.clone(),
            })?;
        Ok((page, Some(sub_page)))
    }

    /// Every selection the registry can resolve: each page, then each of its sub-pages.
    pub fn selections(&self) -> Vec<NavigationSelection> {
        let mut selections = Vec::new();
        for page in self.pages.values() {
            selections.push(NavigationSelection::page(page.id.clone()));
            for sub_page in &page.sub_pages {
                selections
                    .push(NavigationSelection::page(page.id.clone()).with_sub_page(sub_page.id.clone()));
            }
        }
        selections
    }

    /// Fails if any selection renders into one of the `reserved` targets.
    pub fn ensure_targets_free(&self, reserved: &[&TargetId]) -> Result<(), RegistryError> {
        for selection in self.selections() {
            let target = self.target_for(&selection);
            if reserved.contains(&&target) {
                return Err(RegistryError::TargetCollision {
                    selection: selection.to_string(),
                    target,
                });
            }
        }
        Ok(())
    }

    pub fn validate(&self, selection: &NavigationSelection) -> Result<(), NavigationError> {
        self.lookup(selection).map(|_| ())
    }

    /// Target the selection's main content is rendered into.
    pub fn target_for(&self, selection: &NavigationSelection) -> TargetId {
        let explicit = match self.lookup(selection) {
            Ok((_, Some(sub_page))) => sub_page.target.clone(),
            Ok((page, None)) => page.target.clone(),
            Err(_) => None,
        };
        explicit.unwrap_or_else(|| TargetId::for_selection(selection))
    }

    pub fn resolve(&self, selection: &NavigationSelection) -> Result<Route<'_>, NavigationError> {
        let route = match self.lookup(selection)? {
            (_, Some(sub_page)) => match &sub_page.renderer {
                Some(renderer) => Route::Renderer(renderer.as_ref()),
                None => Route::UnderConstruction {
                    title: &sub_page.title,
                },
            },
            (page, None) => match &page.renderer {
                Some(renderer) => Route::Renderer(renderer.as_ref()),
                None if page.sub_pages.is_empty() => Route::UnderConstruction { title: &page.title },
                None => Route::AwaitingSubPage {
                    title: &page.title,
                    sub_pages: page.sub_pages.iter().map(|sub| sub.title.as_str()).collect(),
                },
            },
        };
        Ok(route)
    }
}

#[derive(Default)]
pub struct PageRegistryBuilder {
    pages: Vec<PageEntry>,
    header: Option<SharedRenderer>,
    footer: Option<SharedRenderer>,
}

impl PageRegistryBuilder {
    pub fn page(mut self, page: PageEntry) -> Self {
        self.pages.push(page);
        self
    }

    pub fn header(mut self, renderer: impl PageRenderer + 'static) -> Self {
        self.header = Some(Arc::new(renderer));
        self
    }

    pub fn footer(mut self, renderer: impl PageRenderer + 'static) -> Self {
        self.footer = Some(Arc::new(renderer));
        self
    }

    pub fn build(self) -> Result<PageRegistry, RegistryError> {
        let mut pages = IndexMap::with_capacity(self.pages.len());
        for page in self.pages {
            check_id(page.id.as_str())?;
            let mut seen = Vec::with_capacity(page.sub_pages.len());
            for sub_page in &page.sub_pages {
                check_id(sub_page.id.as_str())?;
                if seen.contains(&&sub_page.id) {
                    return Err(RegistryError::DuplicateSubPage {
                        page: page.id.clone(),
                        sub_page: sub_page.id.clone(),
                    });
                }
                seen.push(&sub_page.id);
            }
            if pages.contains_key(&page.id) {
                return Err(RegistryError::DuplicatePage { page: page.id });
            }
            pages.insert(page.id.clone(), page);
        }
        Ok(PageRegistry {
            pages,
            header: self.header,
            footer: self.footer,
        })
    }
}

fn check_id(id: &str) -> Result<(), RegistryError> {
    let reason = if id.is_empty() {
        "ids must not be empty"
    } else if id.contains('/') {
        "`/` separates a page from its sub-page"
    } else if id.starts_with(CHROME_CONTEXT_PREFIX) {
        "`~` is reserved for header and footer state"
    } else {
        return Ok(());
    };
    Err(RegistryError::InvalidId {
        id: id.to_owned(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> FnPage<impl Fn(&mut RenderContext<'_>) -> Result<(), RenderError> + Send + Sync> {
        page_fn(|_ctx| Ok(()))
    }

    fn registry() -> PageRegistry {
        PageRegistry::builder()
            .page(PageEntry::new("home", "Home").renderer(noop()))
            .page(
                PageEntry::new("course", "Course")
                    .sub_page(SubPageEntry::new("intro", "Intro").renderer(noop()))
                    .sub_page(SubPageEntry::new("quiz", "Quiz").target("quiz-panel")),
            )
            .page(PageEntry::new("about", "About"))
            .build()
            .expect("valid registry")
    }

    #[test]
    fn resolves_every_route_kind() {
        let registry = registry();
        assert!(matches!(
            registry.resolve(&NavigationSelection::page("home")),
            Ok(Route::Renderer(_))
        ));
        assert!(matches!(
            registry.resolve(&NavigationSelection::page("about")),
            Ok(Route::UnderConstruction { title: "About" })
        ));
        match registry.resolve(&NavigationSelection::page("course")) {
            Ok(Route::AwaitingSubPage { title, sub_pages }) => {
                assert_eq!(title, "Course");
                assert_eq!(sub_pages, vec!["Intro", "Quiz"]);
            }
            other => panic!("unexpected route {other:?}"),
        }
        assert!(matches!(
            registry.resolve(&NavigationSelection::page("course").with_sub_page("quiz")),
            Ok(Route::UnderConstruction { title: "Quiz" })
        ));
    }

    #[test]
    fn rejects_unknown_selections() {
        let registry = registry();
        assert_eq!(
            registry.validate(&NavigationSelection::page("nope")),
            Err(NavigationError::UnknownPage { page: "nope".into() })
        );
        assert_eq!(
            registry.validate(&NavigationSelection::page("home").with_sub_page("x")),
            Err(NavigationError::NoSubPages { page: "home".into() })
        );
        assert_eq!(
            registry.validate(&NavigationSelection::page("course").with_sub_page("x")),
            Err(NavigationError::UnknownSubPage {
                page: "course".into(),
                sub_page: "x".into(),
            })
        );
    }

    #[test]
    fn explicit_targets_override_defaults() {
        let registry = registry();
        assert_eq!(
            registry.target_for(&NavigationSelection::page("course").with_sub_page("quiz")),
            TargetId::new("quiz-panel")
        );
        assert_eq!(
            registry.target_for(&NavigationSelection::page("course").with_sub_page("intro")),
            TargetId::new("main:course/intro")
        );
    }

    #[test]
    fn build_validates_ids() {
        let duplicate = PageRegistry::builder()
            .page(PageEntry::new("home", "Home"))
            .page(PageEntry::new("home", "Again"))
            .build();
        assert_eq!(
            duplicate.err(),
            Some(RegistryError::DuplicatePage { page: "home".into() })
        );

        let slash = PageRegistry::builder()
            .page(PageEntry::new("a/b", "Bad"))
            .build();
        assert!(matches!(slash, Err(RegistryError::InvalidId { .. })));

        let sub_dup = PageRegistry::builder()
            .page(
                PageEntry::new("course", "Course")
                    .sub_page(SubPageEntry::new("intro", "Intro"))
                    .sub_page(SubPageEntry::new("intro", "Intro 2")),
            )
            .build();
        assert_eq!(
            sub_dup.err(),
            Some(RegistryError::DuplicateSubPage {
                page: "course".into(),
                sub_page: "intro".into(),
            })
        );
    }
}
