//! Library components of the `labrec` command-line tool.

pub mod logging;
pub mod pipeline;
