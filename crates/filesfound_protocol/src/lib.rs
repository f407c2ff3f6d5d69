//! Files Found Trigger - shared protocol types
//!
//! Wire format spoken between the controller and a remote agent when a
//! directory search runs on a node other than the local controller, plus
//! the home-directory resolution shared by every binary.
//!
//! # Frame Format
//!
//! ```text
//! [LEN:4 little endian][bincode payload:LEN]
//! ```
//!
//! One request frame is written to the agent's stdin and exactly one
//! reply frame is read back from its stdout.

pub mod paths;
pub mod wire;

pub use paths::{default_config_path, default_logs_dir, filesfound_home};
pub use wire::{read_frame, write_frame, ScanReply, ScanRequest, WireMessage};
