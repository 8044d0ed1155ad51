//! Session types shared by AgriGuru services.
//!
//! Provides the session cookie builders and the payload stored server-side
//! for each authenticated browser session.

pub mod cookie;
pub mod session;
