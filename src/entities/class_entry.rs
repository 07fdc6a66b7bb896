// Class Entry - one logged lesson
//
// Entries are addressed by position in the owning log, and also carry a
// stable id so an edit aimed at a later entry survives a deletion above it.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassEntryId(Uuid);

impl ClassEntryId {
    pub fn new() -> Self {
        ClassEntryId(Uuid::new_v4())
    }
}

impl Default for ClassEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClassEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attendance {
    Taken,
    NotTaken,
}

impl Attendance {
    pub fn toggled(&self) -> Self {
        match self {
            Attendance::Taken => Attendance::NotTaken,
            Attendance::NotTaken => Attendance::Taken,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Attendance::Taken => "Taken",
            Attendance::NotTaken => "Not taken",
        }
    }
}

impl FromStr for Attendance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "taken" | "yes" => Ok(Attendance::Taken),
            "nottaken" | "missed" | "no" => Ok(Attendance::NotTaken),
            _ => Err(format!("unknown attendance {s:?} (expected taken or not-taken)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HomeworkDone {
    Yes,
    No,
}

impl HomeworkDone {
    pub fn toggled(&self) -> Self {
        match self {
            HomeworkDone::Yes => HomeworkDone::No,
            HomeworkDone::No => HomeworkDone::Yes,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HomeworkDone::Yes => "Yes",
            HomeworkDone::No => "No",
        }
    }
}

impl FromStr for HomeworkDone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yes" | "y" | "done" => Ok(HomeworkDone::Yes),
            "no" | "n" => Ok(HomeworkDone::No),
            _ => Err(format!("unknown homework flag {s:?} (expected yes or no)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassEntry {
    pub id: ClassEntryId,
    pub date: NaiveDate,
    pub attendance: Attendance,
    pub homework_done: HomeworkDone,
    pub next_assignment: String,
    pub notes: String,
}

impl ClassEntry {
    /// Fresh entry: not taken, homework not done, no assignment or notes
    pub fn new(date: NaiveDate) -> Self {
        ClassEntry {
            id: ClassEntryId::new(),
            date,
            attendance: Attendance::NotTaken,
            homework_done: HomeworkDone::No,
            next_assignment: String::new(),
            notes: String::new(),
        }
    }

    /// Replace the one field named by `edit`
    pub fn apply(&mut self, edit: ClassEdit) {
        match edit {
            ClassEdit::Date(date) => self.date = date,
            ClassEdit::Attendance(attendance) => self.attendance = attendance,
            ClassEdit::HomeworkDone(done) => self.homework_done = done,
            ClassEdit::NextAssignment(text) => self.next_assignment = text,
            ClassEdit::Notes(text) => self.notes = text,
        }
    }
}

/// A single-field edit of a class entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassEdit {
    Date(NaiveDate),
    Attendance(Attendance),
    HomeworkDone(HomeworkDone),
    NextAssignment(String),
    Notes(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_new_entry_defaults() {
        let entry = ClassEntry::new(day(4));
        assert_eq!(entry.date, day(4));
        assert_eq!(entry.attendance, Attendance::NotTaken);
        assert_eq!(entry.homework_done, HomeworkDone::No);
        assert!(entry.next_assignment.is_empty());
        assert!(entry.notes.is_empty());
    }

    #[test]
    fn test_apply_touches_one_field() {
        let mut entry = ClassEntry::new(day(4));
        let id = entry.id;

        entry.apply(ClassEdit::Attendance(Attendance::Taken));
        entry.apply(ClassEdit::Notes("Lovely legato".to_string()));

        assert_eq!(entry.id, id);
        assert_eq!(entry.attendance, Attendance::Taken);
        assert_eq!(entry.notes, "Lovely legato");
        assert_eq!(entry.homework_done, HomeworkDone::No);
        assert_eq!(entry.date, day(4));
    }

    #[test]
    fn test_parse_flags() {
        assert_eq!("not-taken".parse::<Attendance>(), Ok(Attendance::NotTaken));
        assert_eq!("Taken".parse::<Attendance>(), Ok(Attendance::Taken));
        assert_eq!("y".parse::<HomeworkDone>(), Ok(HomeworkDone::Yes));
        assert!("maybe".parse::<HomeworkDone>().is_err());
    }
}
