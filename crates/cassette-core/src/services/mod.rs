//! Services built on top of the request client
//!
//! - `song_poll`: waits for a generating song to finish
//! - `status`: server liveness checks and change notifications

pub mod song_poll;
pub mod status;

pub use song_poll::{PollConfig, SongPoller};
pub use status::{ServerState, StatusMonitor};
