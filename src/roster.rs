// 🎼 Roster Repository - the tutor's students, persisted on every change
//
// The roster owns its persistence port. Each mutating method:
// 1. resolves its target (fails closed on a miss, nothing changes)
// 2. applies the change in memory
// 3. saves the full snapshot synchronously
//
// A failed save still leaves the change in memory and marks the roster
// dirty; the next successful save (or `flush`) writes it out.

use log::{debug, info, warn};

use crate::class_log::ClassLogEditor;
use crate::entities::{ActiveStatus, Student, StudentDraft, StudentId, StudentPatch};
use crate::error::RosterError;
use crate::payments::{payment_rows, PaymentRow, PaymentTracker};
use crate::schedule::MonthRollover;
use crate::snapshot::{self, SnapshotOrigin};
use crate::store::SnapshotStore;

// ============================================================================
// CONFIRMATION GATE
// ============================================================================

/// Answers "are you sure?" before a student is deleted
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

impl Confirm for bool {
    fn confirm(&mut self, _prompt: &str) -> bool {
        *self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Removal {
    Removed(Student),
    Declined,
}

// ============================================================================
// OPEN OPTIONS
// ============================================================================

#[derive(Debug, Clone)]
pub struct RosterOptions {
    /// Storage key of the snapshot
    pub key: String,
    /// Start with the seed student when nothing is stored yet
    pub seed_on_first_run: bool,
    pub rollover: MonthRollover,
}

impl Default for RosterOptions {
    fn default() -> Self {
        RosterOptions {
            key: crate::store::ROSTER_KEY.to_string(),
            seed_on_first_run: true,
            rollover: MonthRollover::default(),
        }
    }
}

// ============================================================================
// ROSTER
// ============================================================================

pub struct Roster<S: SnapshotStore> {
    students: Vec<Student>,
    selected: StudentId,
    /// Fallback shown when the selection is not in the roster
    seed: Student,
    store: S,
    key: String,
    rollover: MonthRollover,
    dirty: bool,
}

impl<S: SnapshotStore> Roster<S> {
    /// Load the stored snapshot, or start fresh if there is none
    pub fn open(store: S, options: RosterOptions) -> Result<Self, RosterError> {
        let raw = store.load(&options.key)?;

        let (students, migrated) = match raw {
            Some(raw) => {
                let decoded = snapshot::decode(&raw)?;
                info!(
                    "Loaded {} students from {} (key {:?})",
                    decoded.students.len(),
                    store.describe(),
                    options.key
                );
                (decoded.students, decoded.origin == SnapshotOrigin::Legacy)
            }
            None if options.seed_on_first_run => {
                info!("No roster stored in {}; starting with the seed student", store.describe());
                (vec![Student::seed()], false)
            }
            None => (Vec::new(), false),
        };

        let mut roster = Roster::with_students(store, students, options);
        if migrated {
            // Rewrite once so the legacy layout never has to be read again.
            // On failure the roster stays dirty; the next save repairs it.
            if let Err(err) = roster.persist() {
                warn!("Migrated roster kept in memory only: {}", err);
            }
        }
        Ok(roster)
    }

    /// Roster over `students` without reading the store
    pub fn with_students(store: S, students: Vec<Student>, options: RosterOptions) -> Self {
        let seed = Student::seed();
        let selected = students.first().map(|s| s.id).unwrap_or(seed.id);
        Roster {
            students,
            selected,
            seed,
            store,
            key: options.key,
            rollover: options.rollover,
            dirty: false,
        }
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// All students in insertion order
    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Active students, or everyone when `include_inactive`
    pub fn list(&self, include_inactive: bool) -> Vec<&Student> {
        self.students
            .iter()
            .filter(|s| include_inactive || s.is_active())
            .collect()
    }

    pub fn get(&self, id: StudentId) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    /// First student with exactly this name
    pub fn find_by_name(&self, name: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.name == name)
    }

    pub fn selected_id(&self) -> StudentId {
        self.selected
    }

    /// The selected student, or the seed student when it is not in the roster
    pub fn selected(&self) -> &Student {
        self.get(self.selected).unwrap_or(&self.seed)
    }

    /// True when the selection points at a student that is actually stored
    pub fn has_live_selection(&self) -> bool {
        self.get(self.selected).is_some()
    }

    pub fn rollover(&self) -> MonthRollover {
        self.rollover
    }

    /// Schedule of `id` zipped with its payment statuses
    pub fn payment_rows(&self, id: StudentId) -> Result<Vec<PaymentRow>, RosterError> {
        let student = self.get(id).ok_or(RosterError::StudentNotFound(id))?;
        Ok(payment_rows(student, self.rollover)?)
    }

    /// Memory holds changes that storage does not
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    pub fn select(&mut self, id: StudentId) -> Result<(), RosterError> {
        if self.get(id).is_none() {
            warn!("Cannot select {}: not in the roster", id);
            return Err(RosterError::StudentNotFound(id));
        }
        self.selected = id;
        Ok(())
    }

    /// Validate `draft`, append the new student and select it
    pub fn add(&mut self, draft: &StudentDraft) -> Result<StudentId, RosterError> {
        let student = Student::from_draft(draft).map_err(|err| {
            debug!("Rejected new student draft: {}", err);
            err
        })?;
        let id = student.id;

        debug!("Adding student {} ({}, {})", student.name, id, student.billing_mode);
        self.students.push(student);
        self.selected = id;
        self.persist()?;
        Ok(id)
    }

    /// Edit details of `id`.
    ///
    /// A billing-mode change re-seeds the payment slots at the new length,
    /// and is refused once any slot is Paid.
    pub fn update(&mut self, id: StudentId, patch: StudentPatch) -> Result<(), RosterError> {
        let index = self.index_of(id)?;
        let student = &mut self.students[index];

        if let Some(mode) = patch.billing_mode {
            if mode != student.billing_mode && student.payment.has_payments() {
                return Err(RosterError::PaymentsRecorded {
                    paid: student.payment.paid_count(),
                });
            }
        }
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(crate::error::ValidationError::MissingName.into());
            }
        }

        let StudentPatch {
            name,
            email,
            phone,
            start_date,
            billing_mode,
        } = patch;

        if let Some(name) = name {
            student.name = name.trim().to_string();
        }
        if let Some(email) = email {
            student.email = email.trim().to_string();
        }
        if let Some(phone) = phone {
            student.phone = phone.trim().to_string();
        }
        if let Some(start_date) = start_date {
            student.start_date = start_date;
        }
        if let Some(mode) = billing_mode {
            if mode != student.billing_mode {
                student.billing_mode = mode;
                student.payment = crate::entities::PaymentRecord::seeded(mode);
            }
        }

        debug!("Updated student {}", id);
        self.persist()
    }

    /// Delete `id` once `gate` confirms.
    ///
    /// Removing the selected student moves the selection to the first
    /// remaining one, or to the seed student when none remain.
    pub fn remove(&mut self, id: StudentId, gate: &mut impl Confirm) -> Result<Removal, RosterError> {
        let index = self.index_of(id)?;

        let prompt = format!("Remove {}? This cannot be undone.", self.students[index].name);
        if !gate.confirm(&prompt) {
            debug!("Removal of {} declined", id);
            return Ok(Removal::Declined);
        }

        let removed = self.students.remove(index);
        if self.selected == id {
            self.selected = self.students.first().map(|s| s.id).unwrap_or(self.seed.id);
        }

        debug!("Removed student {} ({})", removed.name, id);
        self.persist()?;
        Ok(Removal::Removed(removed))
    }

    /// Flip Active/Inactive; returns the new status
    pub fn toggle_active(&mut self, id: StudentId) -> Result<ActiveStatus, RosterError> {
        let index = self.index_of(id)?;
        let status = self.students[index].status.toggled();
        self.students[index].status = status;

        debug!("Student {} is now {}", id, status.as_str());
        self.persist()?;
        Ok(status)
    }

    /// Class log of the selected student
    pub fn class_log(&mut self) -> ClassLogEditor<'_, S> {
        ClassLogEditor::new(self)
    }

    /// Payment record of the selected student
    pub fn payments(&mut self) -> PaymentTracker<'_, S> {
        PaymentTracker::new(self)
    }

    /// Retry saving after an earlier failure
    pub fn flush(&mut self) -> Result<(), RosterError> {
        if !self.dirty {
            return Ok(());
        }
        self.persist()
    }

    /// Replace the whole roster (legacy import) and save it
    pub fn replace_all(&mut self, students: Vec<Student>) -> Result<(), RosterError> {
        info!("Replacing roster with {} students", students.len());
        self.students = students;
        self.selected = self.students.first().map(|s| s.id).unwrap_or(self.seed.id);
        self.persist()
    }

    // ------------------------------------------------------------------------
    // Internals shared with the editors
    // ------------------------------------------------------------------------

    fn index_of(&self, id: StudentId) -> Result<usize, RosterError> {
        self.students
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| {
                warn!("Student {} is not in the roster", id);
                RosterError::StudentNotFound(id)
            })
    }

    /// Run `change` on the selected student, then save if it succeeded
    pub(crate) fn mutate_selected<T>(
        &mut self,
        change: impl FnOnce(&mut Student) -> Result<T, RosterError>,
    ) -> Result<T, RosterError> {
        let index = self.index_of(self.selected)?;
        let value = change(&mut self.students[index])?;
        self.persist()?;
        Ok(value)
    }

    pub(crate) fn selected_live(&self) -> Result<&Student, RosterError> {
        let index = self.index_of(self.selected)?;
        Ok(&self.students[index])
    }

    fn persist(&mut self) -> Result<(), RosterError> {
        self.dirty = true;
        let raw = snapshot::encode(&self.students)?;

        match self.store.save(&self.key, &raw) {
            Ok(()) => {
                self.dirty = false;
                debug!("Saved {} students to {}", self.students.len(), self.store.describe());
                Ok(())
            }
            Err(err) => {
                warn!("Could not save roster to {}: {}", self.store.describe(), err);
                Err(err.into())
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
