//! Shared library for the St. Kilian parish skill.
//!
//! Day resolution, schedule lookup, response text and the reminder flow live
//! here, along with access to the parish table. The Lambda crate only maps
//! Alexa requests onto these.

pub mod calendar;
pub mod config;
pub mod days;
pub mod db;
pub mod error;
pub mod format;
pub mod holydays;
pub mod models;
pub mod reminder;
pub mod schedule;
pub mod store;

pub use config::Config;
pub use db::DynamoStore;
pub use error::{Error, Result};
pub use format::SpokenResponse;
pub use reminder::{AlexaReminderClient, ApiAccess, ReminderService};
pub use store::{MemoryStore, ParishData, ParishStore};
