//! Data models module
//!
//! This module contains all data structures used throughout the engine

pub mod account;
pub mod event;
pub mod participation;
pub mod feedback;

// Re-export commonly used models
pub use account::{Account, Profile, Role, NewAccount, UpdateAccountRequest, UpdateProfileRequest};
pub use event::{Event, EventStatus, EventCapacity, NewEvent, CreateEventRequest, UpdateEventRequest, ImageUpload, EventQuery};
pub use participation::{Participation, ParticipantEntry};
pub use feedback::{Feedback, NewFeedback, RatingSummary};
