//! Database repositories module
//! 
//! PostgreSQL queries grouped by table. Every function runs on the caller's
//! connection so it can take part in an open transaction.

pub mod account;
pub mod event;
pub mod capacity;
pub mod participation;
pub mod feedback;

// Re-export repositories
pub use account::AccountRepository;
pub use event::EventRepository;
pub use capacity::CapacityRepository;
pub use participation::ParticipationRepository;
pub use feedback::FeedbackRepository;
