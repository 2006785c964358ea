// File: ./src/model/mod.rs
pub mod editor;
pub mod grammar;
pub mod item;
pub mod parser;

pub use editor::{EditError, append_task, reschedule, update_task};
pub use grammar::TimeStyle;
pub use item::{NewTask, TaskChanges, TaskRecord, TaskTime, TimeChange};
pub use parser::extract;
