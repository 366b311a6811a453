//! Record domain entity and its write payloads.

use serde::{Deserialize, Serialize};

/// A row of the `teste` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Store-assigned key, never reused or changed
    pub id: i32,
    pub name: String,
    pub age: i32,
    pub course: String,
}

/// Payload for inserting a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    /// Explicit key. Leave unset to let the store assign one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub name: String,
    pub age: i32,
    pub course: String,
}

impl NewRecord {
    pub fn new(name: impl Into<String>, age: i32, course: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            age,
            course: course.into(),
        }
    }

    /// Pin the key instead of letting the store assign it.
    pub fn with_id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }
}

/// The three rows inserted by `roster seed`.
pub fn sample_records() -> Vec<NewRecord> {
    vec![
        NewRecord::new("João", 25, "Engenharia"),
        NewRecord::new("Maria", 22, "Medicina"),
        NewRecord::new("Pedro", 30, "Direito"),
    ]
}

/// Atomic update applied to the age column by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeUpdate {
    Set(i32),
    Increment(i32),
    Decrement(i32),
    Multiply(i32),
    Divide(i32),
}

/// Partial update of a record. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPatch {
    pub name: Option<String>,
    pub age: Option<AgeUpdate>,
    pub course: Option<String>,
}

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn age(mut self, update: AgeUpdate) -> Self {
        self.age = Some(update);
        self
    }

    pub fn course(mut self, course: impl Into<String>) -> Self {
        self.course = Some(course.into());
        self
    }

    /// True when applying the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.age.is_none() && self.course.is_none()
    }
}

impl From<NewRecord> for RecordPatch {
    /// Overwrite every mutable column with the payload's values.
    fn from(data: NewRecord) -> Self {
        Self {
            name: Some(data.name),
            age: Some(AgeUpdate::Set(data.age)),
            course: Some(data.course),
        }
    }
}
