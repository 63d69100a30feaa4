//! Tree and fan chart workspaces.
//!
//! # Responsibility
//! - Load the family graph for the current person, derive the hierarchy for
//!   the chart's mode and hand it to a `ChartRenderer`.
//!
//! # Invariants
//! - Hierarchies are rebuilt on every `load_person`; nothing is cached across
//!   persons.
//! - A failed load leaves the bound person, view and people untouched.
//! - Charts never hold edits, so the save gate always allows leaving them.

use crate::hierarchy::{HierarchyBuilder, HierarchyDirection, HierarchyNode};
use crate::model::person::{Person, PersonId};
use crate::store::PersonStore;
use crate::workspace::{CurrentPerson, Toolbar, Workspace, WorkspaceError, WorkspaceMode};
use async_trait::async_trait;
use log::{debug, info};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

/// Hierarchy (or pair of hierarchies) shown by one chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ChartView {
    Single(HierarchyNode),
    Combined {
        ancestors: HierarchyNode,
        descendants: HierarchyNode,
    },
}

impl ChartView {
    pub fn root_id(&self) -> PersonId {
        match self {
            Self::Single(root) => root.person_id,
            Self::Combined { ancestors, .. } => ancestors.person_id,
        }
    }

    /// Whether `person_id` appears anywhere in the chart.
    pub fn contains(&self, person_id: PersonId) -> bool {
        let roots = match self {
            Self::Single(root) => vec![root],
            Self::Combined {
                ancestors,
                descendants,
            } => vec![ancestors, descendants],
        };
        let mut pending = roots;
        while let Some(node) = pending.pop() {
            if node.person_id == person_id {
                return true;
            }
            pending.extend(node.children.iter());
        }
        false
    }
}

/// Presentation sink for charts.
pub trait ChartRenderer {
    fn render(&self, mode: WorkspaceMode, heading: &str, view: &ChartView);

    /// Called when the chart is torn down.
    fn clear(&self, _mode: WorkspaceMode) {}
}

/// Heading shown above a chart.
pub fn chart_heading(mode: WorkspaceMode, person: &Person) -> String {
    match mode {
        WorkspaceMode::AncestorFan => "Ancestors Fan Chart".to_string(),
        WorkspaceMode::DescendantFan => "Descendant Fan Chart".to_string(),
        WorkspaceMode::AncestorTree => format!("Ancestors of {}", person.display_name),
        WorkspaceMode::DescendantTree => format!("Descendants of {}", person.display_name),
        WorkspaceMode::CombinedTree | WorkspaceMode::Editor => {
            format!("Family of {}", person.display_name)
        }
    }
}

/// Builds the view for `mode` rooted at `root`.
pub fn chart_view(mode: WorkspaceMode, builder: &HierarchyBuilder, root: PersonId) -> ChartView {
    match mode {
        WorkspaceMode::AncestorTree | WorkspaceMode::AncestorFan => {
            ChartView::Single(builder.build(root, HierarchyDirection::Ancestor))
        }
        WorkspaceMode::DescendantTree | WorkspaceMode::DescendantFan => {
            ChartView::Single(builder.build(root, HierarchyDirection::Descendant))
        }
        WorkspaceMode::CombinedTree | WorkspaceMode::Editor => ChartView::Combined {
            ancestors: builder.build(root, HierarchyDirection::Ancestor),
            descendants: builder.build(root, HierarchyDirection::Descendant),
        },
    }
}

pub struct ChartWorkspace {
    mode: WorkspaceMode,
    store: Rc<dyn PersonStore>,
    renderer: Rc<dyn ChartRenderer>,
    current: CurrentPerson,
    view: RefCell<Option<ChartView>>,
    heading: RefCell<String>,
    people: RefCell<Vec<Person>>,
}

impl ChartWorkspace {
    pub fn new(
        mode: WorkspaceMode,
        store: Rc<dyn PersonStore>,
        renderer: Rc<dyn ChartRenderer>,
        current: CurrentPerson,
    ) -> Self {
        Self {
            mode,
            store,
            renderer,
            current,
            view: RefCell::new(None),
            heading: RefCell::new(String::new()),
            people: RefCell::new(Vec::new()),
        }
    }

    /// Last rendered view.
    pub fn view(&self) -> Option<ChartView> {
        self.view.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Workspace for ChartWorkspace {
    fn mode(&self) -> WorkspaceMode {
        self.mode
    }

    fn initialize_controls(&self, _toolbar: &mut Toolbar) {}

    async fn save_if_needed(&self) -> Result<bool, WorkspaceError> {
        Ok(true)
    }

    async fn load_person(&self, person: Person) -> Result<(), WorkspaceError> {
        let people = self.store.load_people().await?;
        let edges = self.store.load_relationships().await?;

        let builder = HierarchyBuilder::new(&people, &edges);
        let view = chart_view(self.mode, &builder, person.id);
        debug!(
            "event=chart_build module=workspace status=ok mode={} person_id={} edges={}",
            self.mode,
            person.id,
            edges.len()
        );

        *self.people.borrow_mut() = people;
        *self.heading.borrow_mut() = chart_heading(self.mode, &person);
        *self.view.borrow_mut() = Some(view);
        Ok(())
    }

    fn present(&self) {
        let view = self.view.borrow();
        let Some(view) = view.as_ref() else {
            return;
        };
        self.renderer.render(self.mode, &self.heading.borrow(), view);
        info!(
            "event=chart_render module=workspace status=ok mode={} person_id={}",
            self.mode,
            view.root_id()
        );
    }

    async fn select_person(&self, person_id: PersonId) -> Result<bool, WorkspaceError> {
        let shown = self
            .view
            .borrow()
            .as_ref()
            .is_some_and(|view| view.contains(person_id));
        let person = self
            .people
            .borrow()
            .iter()
            .find(|person| person.id == person_id)
            .cloned();
        let Some(person) = person.filter(|_| shown) else {
            debug!(
                "event=chart_select module=workspace status=ignored mode={} person_id={person_id}",
                self.mode
            );
            return Ok(false);
        };

        self.load_person(person.clone()).await?;
        self.current.replace(person);
        self.present();
        Ok(true)
    }

    /// Clears the renderer only for a chart that was actually loaded.
    fn teardown(&self) {
        self.people.borrow_mut().clear();
        self.heading.borrow_mut().clear();
        if self.view.borrow_mut().take().is_some() {
            self.renderer.clear(self.mode);
        }
    }
}
