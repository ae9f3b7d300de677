pub mod natural_date;
pub mod task_text;
