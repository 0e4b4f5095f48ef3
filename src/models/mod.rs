pub mod identity;
pub mod message;
pub mod session;
pub mod topic;

pub use identity::{Identity, PlanStatus};
pub use message::Message;
pub use session::{SearchHit, Session, SessionBuckets};
pub use topic::Topic;
