//! Person editor workspace.
//!
//! # Responsibility
//! - Hold the loaded snapshot of one person and the edits made against it.
//! - Save edits through `PersonStore`, directly (Save button) or via the save
//!   gate when the session navigates away.
//!
//! # Invariants
//! - The snapshot is replaced wholesale on load and on successful save only.
//! - Dirty means any tracked field or the relationship list differs from the
//!   snapshot.
//! - Relationships are edited from the person's own view and converted to
//!   positive parent → child edges only when handed to the store.

use crate::format::relationship_text;
use crate::model::person::{
    Person, PersonAllDetails, PersonFullDetails, PersonId, PersonValidationError,
    UNASSIGNED_PERSON_ID,
};
use crate::model::relationship::{RelationshipEdge, RelationshipToMe, RelationshipType};
use crate::prompt::ConfirmationPrompt;
use crate::store::{PersonStore, SaveResponse, StoreError};
use crate::workspace::gate::{run_save_gate, GateSubject, SAVE_PROMPT_TITLE};
use crate::workspace::{CurrentPerson, Toolbar, Workspace, WorkspaceError, WorkspaceMode};
use async_trait::async_trait;
use log::{info, warn};
use std::cell::RefCell;
use std::rc::Rc;

pub const SAVE_BUTTON_ID: &str = "SaveButtonId";

/// Editable detail fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorField {
    DisplayName,
    DateOfBirth,
    DateOfDeath,
    AdditionalNotes,
    Veracity,
}

/// One row of the relationships grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipRow {
    pub related_person_id: PersonId,
    pub relationship_type: RelationshipType,
    pub label: String,
}

#[derive(Debug, Default)]
struct EditorState {
    snapshot: Option<PersonAllDetails>,
    form: Option<PersonFullDetails>,
    relationships: Vec<RelationshipToMe>,
}

impl EditorState {
    fn load(&mut self, all: PersonAllDetails) {
        self.form = Some(all.details.clone());
        self.relationships = all.relationships.clone();
        self.snapshot = Some(all);
    }

    fn is_dirty(&self) -> bool {
        let (Some(snapshot), Some(form)) = (&self.snapshot, &self.form) else {
            return false;
        };
        let before = &snapshot.details;
        form.display_name != before.display_name
            || form.date_of_birth != before.date_of_birth
            || form.date_of_death != before.date_of_death
            || form.additional_notes != before.additional_notes
            || form.veracity != before.veracity
            || self.relationships != snapshot.relationships
    }
}

pub struct PersonEditor {
    store: Rc<dyn PersonStore>,
    prompt: Rc<dyn ConfirmationPrompt>,
    current: CurrentPerson,
    state: RefCell<EditorState>,
}

impl PersonEditor {
    pub fn new(
        store: Rc<dyn PersonStore>,
        prompt: Rc<dyn ConfirmationPrompt>,
        current: CurrentPerson,
    ) -> Self {
        Self {
            store,
            prompt,
            current,
            state: RefCell::new(EditorState::default()),
        }
    }

    /// Current edited details, if a person is loaded.
    pub fn form(&self) -> Option<PersonFullDetails> {
        self.state.borrow().form.clone()
    }

    pub fn snapshot(&self) -> Option<PersonAllDetails> {
        self.state.borrow().snapshot.clone()
    }

    pub fn relationships(&self) -> Vec<RelationshipToMe> {
        self.state.borrow().relationships.clone()
    }

    /// Relationships grid rows with their display labels.
    pub fn relationship_rows(&self) -> Vec<RelationshipRow> {
        self.state
            .borrow()
            .relationships
            .iter()
            .map(|rel| RelationshipRow {
                related_person_id: rel.related_person_id,
                relationship_type: rel.relationship_type,
                label: relationship_text(rel.relationship_type),
            })
            .collect()
    }

    /// Applies one field edit. Blank optional values clear the field.
    pub fn set_field(&self, field: EditorField, value: &str) {
        let mut state = self.state.borrow_mut();
        let Some(form) = state.form.as_mut() else {
            return;
        };
        let optional = if value.trim().is_empty() {
            None
        } else {
            Some(value.to_string())
        };
        match field {
            EditorField::DisplayName => form.display_name = value.to_string(),
            EditorField::DateOfBirth => form.date_of_birth = optional,
            EditorField::DateOfDeath => form.date_of_death = optional,
            EditorField::AdditionalNotes => form.additional_notes = optional,
            EditorField::Veracity => form.veracity = optional,
        }
    }

    /// Adds a relationship row, replacing any row for the same person.
    pub fn add_relationship(&self, related_person_id: PersonId, relationship_type: RelationshipType) {
        let mut state = self.state.borrow_mut();
        if state.form.is_none() {
            return;
        }
        let row = RelationshipToMe::new(related_person_id, relationship_type);
        match state
            .relationships
            .iter_mut()
            .find(|rel| rel.related_person_id == related_person_id)
        {
            Some(existing) => *existing = row,
            None => state.relationships.push(row),
        }
    }

    /// Removes the rows for the given related persons; returns how many went.
    pub fn remove_relationships(&self, related_person_ids: &[PersonId]) -> usize {
        let mut state = self.state.borrow_mut();
        let before = state.relationships.len();
        state
            .relationships
            .retain(|rel| !related_person_ids.contains(&rel.related_person_id));
        before - state.relationships.len()
    }

    /// Save button handler. Failures are shown through the prompt.
    pub async fn on_save_clicked(&self) -> Result<bool, WorkspaceError> {
        let errors = self.validation_errors();
        if !errors.is_empty() {
            let body = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n");
            self.prompt.notify(SAVE_PROMPT_TITLE, &body).await;
            return Ok(false);
        }

        let message = match self.save().await {
            Ok(response) if response.success => return Ok(true),
            Ok(response) => response
                .error_message
                .unwrap_or_else(|| "unknown error".to_string()),
            Err(err) if err.is_contract_violation() => return Err(err.into()),
            Err(err) => err.to_string(),
        };
        self.prompt
            .notify(SAVE_PROMPT_TITLE, &format!("Could not save person: {message}"))
            .await;
        Ok(false)
    }

    fn pending_save(&self) -> Option<(PersonFullDetails, Vec<RelationshipToMe>, Vec<RelationshipEdge>)> {
        let state = self.state.borrow();
        let details = state.form.clone()?;
        let edges = state
            .relationships
            .iter()
            .map(|rel| rel.to_edge(details.id))
            .collect();
        Some((details, state.relationships.clone(), edges))
    }
}

#[async_trait(?Send)]
impl GateSubject for PersonEditor {
    fn needs_saving(&self) -> bool {
        self.state.borrow().is_dirty()
    }

    fn validation_errors(&self) -> Vec<PersonValidationError> {
        self.state
            .borrow()
            .form
            .as_ref()
            .map(PersonFullDetails::validation_errors)
            .unwrap_or_default()
    }

    fn pending_display_name(&self) -> String {
        self.state
            .borrow()
            .form
            .as_ref()
            .map(|form| form.display_name.clone())
            .unwrap_or_default()
    }

    fn discard_edits(&self) {
        let mut state = self.state.borrow_mut();
        if let Some(snapshot) = state.snapshot.clone() {
            state.load(snapshot);
        }
    }

    async fn save(&self) -> Result<SaveResponse, StoreError> {
        let Some((mut details, relationships, edges)) = self.pending_save() else {
            return Ok(SaveResponse::failure("no person loaded"));
        };

        let response = self.store.save(&details, &edges).await?;
        if !response.success {
            warn!(
                "event=editor_save module=workspace status=rejected person_id={}",
                details.id
            );
            return Ok(response);
        }

        if let Some(new_id) = response.new_person_id() {
            details.id = new_id;
        }
        info!(
            "event=editor_save module=workspace status=ok person_id={}",
            details.id
        );
        self.current.replace(details.person());
        self.state.borrow_mut().load(PersonAllDetails {
            details,
            relationships,
        });
        Ok(response)
    }
}

#[async_trait(?Send)]
impl Workspace for PersonEditor {
    fn mode(&self) -> WorkspaceMode {
        WorkspaceMode::Editor
    }

    fn initialize_controls(&self, toolbar: &mut Toolbar) {
        toolbar.add_command(SAVE_BUTTON_ID, "Save");
    }

    async fn save_if_needed(&self) -> Result<bool, WorkspaceError> {
        let outcome = run_save_gate(self, self.prompt.as_ref()).await?;
        info!(
            "event=save_gate module=workspace status={} allowed={}",
            outcome.label(),
            outcome.allowed()
        );
        Ok(outcome.allowed())
    }

    async fn load_person(&self, person: Person) -> Result<(), WorkspaceError> {
        if person.id == UNASSIGNED_PERSON_ID {
            self.state.borrow_mut().load(PersonAllDetails {
                details: PersonFullDetails::from_person(&person).with_defaults(),
                relationships: Vec::new(),
            });
            return Ok(());
        }

        let all = self.store.load_full_details(person.id).await?;
        self.state.borrow_mut().load(all);
        Ok(())
    }

    async fn on_command(&self, id: &str) -> Result<(), WorkspaceError> {
        if id != SAVE_BUTTON_ID {
            return Err(WorkspaceError::UnknownCommand(id.to_string()));
        }
        self.on_save_clicked().await.map(|_| ())
    }

    fn teardown(&self) {
        *self.state.borrow_mut() = EditorState::default();
    }
}
