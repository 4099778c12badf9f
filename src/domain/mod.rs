pub mod entry;
pub mod job;
pub mod sent_state;

pub use entry::FeedEntry;
pub use job::Job;
pub use sent_state::SentState;
