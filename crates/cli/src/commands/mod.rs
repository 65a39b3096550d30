pub mod chat;
pub mod memories;
pub mod onboard;
