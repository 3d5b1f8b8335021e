pub mod api;
pub mod models;

pub use api::{MutationAck, PageEnvelope, Pageable};
pub use models::{Channel, Notification, NotificationKind, NotificationRecord};
