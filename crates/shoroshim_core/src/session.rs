//! Genealogy session: the workspace coordinator.
//!
//! # Responsibility
//! - Own the active workspace, the shared current person, the toolbar and the
//!   people list.
//! - Gate every navigation (mode change, person change) through the active
//!   workspace's save gate before acting on it.
//!
//! # Invariants
//! - At most one gated request runs at a time; a second request while one is
//!   suspended fails with `SessionError::TransitionInFlight` and leaves the
//!   pending one untouched.
//! - The active mode changes only after the gate resolved `allowed=true` and
//!   the replacement workspace loaded the current person. A failed load
//!   leaves the previous workspace active and untouched.
//! - No `RefCell` borrow is held across an `.await`.

use crate::model::person::{Gender, Person, PersonId, UNASSIGNED_PERSON_ID};
use crate::store::{PersonStore, StoreError};
use crate::workspace::{
    CurrentPerson, Toolbar, ToolbarItemKind, Workspace, WorkspaceError, WorkspaceFactory,
    WorkspaceMode, PRINT_ID,
};
use log::{info, warn};
use std::cell::{Cell, RefCell};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use uuid::Uuid;

/// Person summaries known to the session, in store order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeopleList {
    people: Vec<Person>,
}

impl PeopleList {
    pub fn new(people: Vec<Person>) -> Self {
        Self { people }
    }

    pub fn get(&self, person_id: PersonId) -> Option<&Person> {
        self.people.iter().find(|person| person.id == person_id)
    }

    /// Replaces the entry with the same id, or appends a new one.
    pub fn upsert(&mut self, person: Person) {
        match self.people.iter_mut().find(|known| known.id == person.id) {
            Some(known) => *known = person,
            None => self.people.push(person),
        }
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }
}

/// Result of a toolbar click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolbarAction {
    /// Mode selector entry; `allowed` is the gate's verdict.
    Transition { mode: WorkspaceMode, allowed: bool },
    /// Print the named element.
    Print(&'static str),
    /// Workspace button handled by the active workspace.
    Command,
    /// Click on something that carries no action.
    Ignored,
}

#[derive(Debug)]
pub enum SessionError {
    /// A gated request arrived while another one was still suspended.
    TransitionInFlight,
    /// Person id not present in the people list.
    UnknownPerson(PersonId),
    Workspace(WorkspaceError),
    Store(StoreError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TransitionInFlight => write!(f, "a workspace transition is already in flight"),
            Self::UnknownPerson(id) => write!(f, "person not in people list: {id}"),
            Self::Workspace(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Workspace(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::TransitionInFlight | Self::UnknownPerson(_) => None,
        }
    }
}

impl From<WorkspaceError> for SessionError {
    fn from(value: WorkspaceError) -> Self {
        Self::Workspace(value)
    }
}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Clears the in-flight flag however the gated request ends.
struct InFlightGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> SessionResult<Self> {
        if flag.replace(true) {
            return Err(SessionError::TransitionInFlight);
        }
        Ok(Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

pub struct GenealogySession {
    store: Rc<dyn PersonStore>,
    factory: Box<dyn WorkspaceFactory>,
    current: CurrentPerson,
    workspace: RefCell<Rc<dyn Workspace>>,
    toolbar: RefCell<Toolbar>,
    people: RefCell<PeopleList>,
    in_flight: Cell<bool>,
}

impl GenealogySession {
    /// Creates a session showing `initial_mode` with no current person.
    pub fn new(
        store: Rc<dyn PersonStore>,
        factory: Box<dyn WorkspaceFactory>,
        initial_mode: WorkspaceMode,
    ) -> Self {
        let current = CurrentPerson::new();
        let workspace = factory.create(initial_mode, current.clone());
        let mut toolbar = Toolbar::standard();
        workspace.initialize_controls(&mut toolbar);

        Self {
            store,
            factory,
            current,
            workspace: RefCell::new(workspace),
            toolbar: RefCell::new(toolbar),
            people: RefCell::new(PeopleList::default()),
            in_flight: Cell::new(false),
        }
    }

    pub fn mode(&self) -> WorkspaceMode {
        self.workspace.borrow().mode()
    }

    pub fn current_person(&self) -> Option<Person> {
        self.current.get()
    }

    /// Handle on the active workspace.
    pub fn workspace(&self) -> Rc<dyn Workspace> {
        self.workspace.borrow().clone()
    }

    pub fn toolbar(&self) -> Toolbar {
        self.toolbar.borrow().clone()
    }

    pub fn people(&self) -> PeopleList {
        self.people.borrow().clone()
    }

    pub fn is_transition_in_flight(&self) -> bool {
        self.in_flight.get()
    }

    /// Reloads the people list from the store.
    pub async fn load_people(&self) -> SessionResult<usize> {
        let people = self.store.load_people().await?;
        let count = people.len();
        *self.people.borrow_mut() = PeopleList::new(people);
        info!("event=people_load module=session status=ok count={count}");
        Ok(count)
    }

    /// Runs the save gate and, when allowed, switches to `target`.
    pub async fn request_transition(&self, target: WorkspaceMode) -> SessionResult<bool> {
        let _guard = InFlightGuard::acquire(&self.in_flight).inspect_err(|_| {
            warn!("event=transition module=session status=rejected reason=in_flight to={target}");
        })?;
        let transition_id = Uuid::new_v4();
        let from = self.mode();
        info!(
            "event=transition module=session status=start transition_id={transition_id} from={from} to={target}"
        );

        if !self.workspace().save_if_needed().await? {
            info!(
                "event=transition module=session status=blocked transition_id={transition_id} from={from} to={target}"
            );
            return Ok(false);
        }
        self.sync_current_person();

        self.activate(target).await?;
        info!(
            "event=transition module=session status=ok transition_id={transition_id} from={from} to={target}"
        );
        Ok(true)
    }

    /// People-list selection, gated like a mode change.
    pub async fn select_person(&self, person_id: PersonId) -> SessionResult<bool> {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;
        let person = self
            .people
            .borrow()
            .get(person_id)
            .cloned()
            .ok_or(SessionError::UnknownPerson(person_id))?;

        let workspace = self.workspace();
        if !workspace.save_if_needed().await? {
            info!("event=person_select module=session status=blocked person_id={person_id}");
            return Ok(false);
        }
        self.sync_current_person();

        workspace.load_person(person.clone()).await?;
        self.current.replace(person);
        workspace.present();
        info!("event=person_select module=session status=ok person_id={person_id}");
        Ok(true)
    }

    /// Starts a new, unsaved person in the editor.
    pub async fn new_person(&self, gender: Gender) -> SessionResult<bool> {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;
        if !self.workspace().save_if_needed().await? {
            return Ok(false);
        }
        self.sync_current_person();

        self.current
            .replace(Person::new(UNASSIGNED_PERSON_ID, String::new(), gender));
        self.activate(WorkspaceMode::Editor).await?;
        info!("event=person_new module=session status=ok");
        Ok(true)
    }

    /// Chart drill-in on a person shown by the active workspace.
    pub async fn drill_in(&self, person_id: PersonId) -> SessionResult<bool> {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;
        Ok(self.workspace().select_person(person_id).await?)
    }

    /// Dispatches a toolbar click.
    pub async fn on_toolbar_click(&self, id: &str) -> SessionResult<ToolbarAction> {
        if id == PRINT_ID {
            return Ok(ToolbarAction::Print(self.mode().print_target()));
        }
        if let Some(mode) = WorkspaceMode::from_id(id) {
            let allowed = self.request_transition(mode).await?;
            return Ok(ToolbarAction::Transition { mode, allowed });
        }

        let kind = self.toolbar.borrow().find(id).map(|item| item.kind);
        if kind != Some(ToolbarItemKind::Command) {
            return Ok(ToolbarAction::Ignored);
        }
        let _guard = InFlightGuard::acquire(&self.in_flight)?;
        self.workspace().on_command(id).await?;
        self.sync_current_person();
        Ok(ToolbarAction::Command)
    }

    /// Replaces the active workspace with a fresh one for `mode`.
    ///
    /// The replacement loads the current person before anything is swapped.
    async fn activate(&self, mode: WorkspaceMode) -> SessionResult<()> {
        let next = self.factory.create(mode, self.current.clone());
        if let Some(person) = self.current.get() {
            if let Err(err) = next.load_person(person).await {
                next.teardown();
                warn!("event=workspace_activate module=session status=error mode={mode} error={err}");
                return Err(err.into());
            }
        }

        let previous = self.workspace();
        previous.teardown();
        {
            let mut toolbar = self.toolbar.borrow_mut();
            toolbar.clear_commands();
            next.initialize_controls(&mut toolbar);
        }
        *self.workspace.borrow_mut() = Rc::clone(&next);
        next.present();
        Ok(())
    }

    /// Mirrors a saved current person into the people list.
    fn sync_current_person(&self) {
        if let Some(person) = self.current.get() {
            if person.id != UNASSIGNED_PERSON_ID {
                self.people.borrow_mut().upsert(person);
            }
        }
    }
}
