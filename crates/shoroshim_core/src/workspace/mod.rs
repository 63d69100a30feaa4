//! Interchangeable session workspaces.
//!
//! # Responsibility
//! - Define the capability every workspace (editor and charts) implements.
//! - Own the mode identifiers, the toolbar model and the shared current-person
//!   handle injected into each workspace.
//!
//! # Invariants
//! - Mode ids are stable strings; they are also the toolbar item ids.
//! - `CurrentPerson` is single-writer: it is replaced wholesale, never
//!   mutated in place, and never borrowed across an `.await`.

pub mod chart;
pub mod editor;
pub mod gate;

use crate::model::person::{Person, PersonId};
use crate::prompt::ConfirmationPrompt;
use crate::store::{PersonStore, StoreError};
use async_trait::async_trait;
use chart::{ChartRenderer, ChartWorkspace};
use editor::PersonEditor;
use gate::GateError;
use std::cell::RefCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

pub const MODES_ID: &str = "modesId";
pub const PRINT_ID: &str = "printId";

/// Session modes, one per workspace kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkspaceMode {
    Editor,
    AncestorTree,
    DescendantTree,
    CombinedTree,
    AncestorFan,
    DescendantFan,
}

impl WorkspaceMode {
    pub const ALL: [WorkspaceMode; 6] = [
        Self::Editor,
        Self::AncestorTree,
        Self::DescendantTree,
        Self::CombinedTree,
        Self::AncestorFan,
        Self::DescendantFan,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Editor => "editorId",
            Self::AncestorTree => "ancestorTreeChartId",
            Self::DescendantTree => "descendantTreeChartId",
            Self::CombinedTree => "combinedTreeChartId",
            Self::AncestorFan => "ancestorFanChartId",
            Self::DescendantFan => "descendantFanChartId",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.id() == id)
    }

    /// Mode selector label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Editor => "Editor",
            Self::AncestorTree => "Ancestor Tree Chart",
            Self::DescendantTree => "Descendant Tree Chart",
            Self::CombinedTree => "Combined Ancestor/Descendant Tree Chart",
            Self::AncestorFan => "Ancestor Fan Chart",
            Self::DescendantFan => "Descendant Fan Chart",
        }
    }

    /// Element printed by the Print button while this mode is active.
    pub fn print_target(self) -> &'static str {
        match self {
            Self::Editor => "PersonEditor",
            Self::AncestorTree => "AncestorChartId",
            Self::DescendantTree => "DescendantChartId",
            Self::CombinedTree => "CombinedAncestorDescendantChartId",
            Self::AncestorFan | Self::DescendantFan => "chartContainer",
        }
    }

    pub fn is_chart(self) -> bool {
        self != Self::Editor
    }
}

impl Display for WorkspaceMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Shared handle on the session's current person.
#[derive(Debug, Clone, Default)]
pub struct CurrentPerson {
    inner: Rc<RefCell<Option<Person>>>,
}

impl CurrentPerson {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current person.
    pub fn get(&self) -> Option<Person> {
        self.inner.borrow().clone()
    }

    pub fn id(&self) -> Option<PersonId> {
        self.inner.borrow().as_ref().map(|person| person.id)
    }

    /// Swaps in a new value and returns the previous one.
    pub fn replace(&self, person: Person) -> Option<Person> {
        self.inner.replace(Some(person))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarItemKind {
    /// Entry of the modes selector.
    Mode(WorkspaceMode),
    Print,
    /// Button contributed by the active workspace.
    Command,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolbarItem {
    pub id: String,
    pub label: String,
    pub kind: ToolbarItemKind,
}

/// Session toolbar: mode selector, Print, then workspace buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolbar {
    items: Vec<ToolbarItem>,
}

impl Toolbar {
    /// Toolbar with only the session-wide items.
    pub fn standard() -> Self {
        let mut items = WorkspaceMode::ALL
            .into_iter()
            .map(|mode| ToolbarItem {
                id: mode.id().to_string(),
                label: mode.label().to_string(),
                kind: ToolbarItemKind::Mode(mode),
            })
            .collect::<Vec<_>>();
        items.push(ToolbarItem {
            id: PRINT_ID.to_string(),
            label: "Print".to_string(),
            kind: ToolbarItemKind::Print,
        });
        Self { items }
    }

    /// Drops workspace buttons, keeping the session-wide items.
    pub fn clear_commands(&mut self) {
        self.items
            .retain(|item| item.kind != ToolbarItemKind::Command);
    }

    pub fn add_command(&mut self, id: impl Into<String>, label: impl Into<String>) {
        let id = id.into();
        self.items.retain(|item| item.id != id);
        self.items.push(ToolbarItem {
            id,
            label: label.into(),
            kind: ToolbarItemKind::Command,
        });
    }

    pub fn find(&self, id: &str) -> Option<&ToolbarItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn items(&self) -> &[ToolbarItem] {
        &self.items
    }
}

impl Default for Toolbar {
    fn default() -> Self {
        Self::standard()
    }
}

/// Workspace-level failures.
#[derive(Debug)]
pub enum WorkspaceError {
    /// Save gate protocol violation.
    Gate(GateError),
    /// Store call failed while loading or saving.
    Store(StoreError),
    /// A chart was asked to render without a current person.
    NoCurrentPerson,
    /// A toolbar command this workspace does not own.
    UnknownCommand(String),
}

impl Display for WorkspaceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gate(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::NoCurrentPerson => write!(f, "no current person selected"),
            Self::UnknownCommand(id) => write!(f, "unknown workspace command: {id}"),
        }
    }
}

impl Error for WorkspaceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Gate(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::NoCurrentPerson | Self::UnknownCommand(_) => None,
        }
    }
}

impl From<GateError> for WorkspaceError {
    fn from(value: GateError) -> Self {
        Self::Gate(value)
    }
}

impl From<StoreError> for WorkspaceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Capability shared by the editor and every chart.
#[async_trait(?Send)]
pub trait Workspace {
    fn mode(&self) -> WorkspaceMode;

    fn mode_id(&self) -> &'static str {
        self.mode().id()
    }

    /// Adds this workspace's buttons to the session toolbar.
    fn initialize_controls(&self, toolbar: &mut Toolbar);

    /// Runs the save gate; `true` means the session may navigate away.
    async fn save_if_needed(&self) -> Result<bool, WorkspaceError>;

    /// Loads and binds `person` without touching the presentation. On error
    /// the workspace keeps whatever it was bound to before.
    async fn load_person(&self, person: Person) -> Result<(), WorkspaceError>;

    /// Pushes the bound state to the presentation layer.
    fn present(&self) {}

    /// Drill-in on a person shown by this workspace. Returns `false` when the
    /// workspace ignores the selection.
    async fn select_person(&self, _person_id: PersonId) -> Result<bool, WorkspaceError> {
        Ok(false)
    }

    /// Handles a toolbar button contributed by `initialize_controls`.
    async fn on_command(&self, id: &str) -> Result<(), WorkspaceError> {
        Err(WorkspaceError::UnknownCommand(id.to_string()))
    }

    /// Releases view state before the workspace is replaced.
    fn teardown(&self) {}
}

/// Instantiates the workspace for a mode.
pub trait WorkspaceFactory {
    fn create(&self, mode: WorkspaceMode, current: CurrentPerson) -> Rc<dyn Workspace>;
}

/// Factory wiring real workspaces to shared collaborators.
pub struct StandardWorkspaceFactory {
    store: Rc<dyn PersonStore>,
    prompt: Rc<dyn ConfirmationPrompt>,
    renderer: Rc<dyn ChartRenderer>,
}

impl StandardWorkspaceFactory {
    pub fn new(
        store: Rc<dyn PersonStore>,
        prompt: Rc<dyn ConfirmationPrompt>,
        renderer: Rc<dyn ChartRenderer>,
    ) -> Self {
        Self {
            store,
            prompt,
            renderer,
        }
    }
}

impl WorkspaceFactory for StandardWorkspaceFactory {
    fn create(&self, mode: WorkspaceMode, current: CurrentPerson) -> Rc<dyn Workspace> {
        match mode {
            WorkspaceMode::Editor => Rc::new(PersonEditor::new(
                Rc::clone(&self.store),
                Rc::clone(&self.prompt),
                current,
            )),
            chart_mode => Rc::new(ChartWorkspace::new(
                chart_mode,
                Rc::clone(&self.store),
                Rc::clone(&self.renderer),
                current,
            )),
        }
    }
}
