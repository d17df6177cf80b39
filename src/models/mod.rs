//! Data models for Explore Events

pub mod category;
pub mod comment;
pub mod compilation;
pub mod datetime;
pub mod enums;
pub mod event;
pub mod hit;
pub mod request;
pub mod user;

// Re-export commonly used types
pub use category::Category;
pub use enums::{EventState, RequestDecision, RequestStatus};
pub use event::{Event, EventFull, EventShort};
pub use hit::{EndpointHit, NewHit, ViewStats};
pub use request::ParticipationRequest;
pub use user::{User, UserShort};
