//! Domain models for CADesk Core

pub mod client;
pub mod common;
pub mod compliance;
pub mod document;
pub mod invoice;
pub mod user;

pub use client::*;
pub use common::{
    parse_date_input, PageRequest, SortOrder, StringUuid, UserSummary,
};
pub use compliance::*;
pub use document::*;
pub use invoice::*;
pub use user::*;
