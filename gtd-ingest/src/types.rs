use anyhow::Result;
use chrono::NaiveDateTime;
use chrono_tz::Tz;
use gtd_core::{NewTask, time::local_to_utc};
use serde::{Deserialize, Serialize};

/// Candidate task fields pulled out of free text. Times are naive local times;
/// the caller decides which timezone they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDateTime>,
    pub effort: i32,
    pub consequences: i32,
    pub desire: i32,
}

impl ExtractedTask {
    pub fn into_new_task(self, tz: Tz) -> Result<NewTask> {
        let due_date = self.due_date.map(|d| local_to_utc(d, tz)).transpose()?;
        let new = NewTask {
            title: self.title,
            description: self.description,
            due_date,
            effort: self.effort,
            consequences: self.consequences,
            desire: self.desire,
            pre_task: None,
        };
        new.validate()?;
        Ok(new)
    }
}
