//! Data transfer objects for callers that speak JSON

pub mod requests;

pub use requests::CreateChannelRequest;
