// Class log editing for the selected student
//
// No confirmation on delete. Each call saves the whole roster.

use chrono::{Local, NaiveDate};
use log::debug;

use crate::entities::{ClassEdit, ClassEntry, ClassEntryId};
use crate::error::RosterError;
use crate::roster::Roster;
use crate::store::SnapshotStore;

pub struct ClassLogEditor<'a, S: SnapshotStore> {
    roster: &'a mut Roster<S>,
}

impl<'a, S: SnapshotStore> ClassLogEditor<'a, S> {
    pub(crate) fn new(roster: &'a mut Roster<S>) -> Self {
        ClassLogEditor { roster }
    }

    pub fn entries(&self) -> Result<&[ClassEntry], RosterError> {
        Ok(&self.roster.selected_live()?.class_log)
    }

    /// Append a default entry dated today
    pub fn append(&mut self) -> Result<ClassEntryId, RosterError> {
        self.append_on(Local::now().date_naive())
    }

    pub fn append_on(&mut self, date: NaiveDate) -> Result<ClassEntryId, RosterError> {
        self.roster.mutate_selected(|student| {
            let entry = ClassEntry::new(date);
            let id = entry.id;
            student.class_log.push(entry);
            debug!("Logged class {} for {} on {}", id, student.name, date);
            Ok(id)
        })
    }

    /// Overwrite one field of the entry at `index`
    pub fn set_field(&mut self, index: usize, edit: ClassEdit) -> Result<(), RosterError> {
        self.roster.mutate_selected(|student| {
            let len = student.class_log.len();
            let entry = student
                .class_log
                .get_mut(index)
                .ok_or(RosterError::ClassIndexOutOfRange { index, len })?;
            entry.apply(edit);
            Ok(())
        })
    }

    pub fn set_field_by_id(&mut self, id: ClassEntryId, edit: ClassEdit) -> Result<(), RosterError> {
        self.roster.mutate_selected(|student| {
            let entry = student
                .class_log
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or(RosterError::ClassEntryNotFound(id))?;
            entry.apply(edit);
            Ok(())
        })
    }

    /// Remove the entry at `index`; later entries shift up by one
    pub fn remove_at(&mut self, index: usize) -> Result<ClassEntry, RosterError> {
        self.roster.mutate_selected(|student| {
            let len = student.class_log.len();
            if index >= len {
                return Err(RosterError::ClassIndexOutOfRange { index, len });
            }
            let removed = student.class_log.remove(index);
            debug!("Removed class {} of {}", removed.id, student.name);
            Ok(removed)
        })
    }

    pub fn remove_by_id(&mut self, id: ClassEntryId) -> Result<ClassEntry, RosterError> {
        self.roster.mutate_selected(|student| {
            let index = student
                .class_log
                .iter()
                .position(|e| e.id == id)
                .ok_or(RosterError::ClassEntryNotFound(id))?;
            Ok(student.class_log.remove(index))
        })
    }
}
