//! File-backed persistence helpers.

pub mod atomic;
pub mod timestamp;

pub use atomic::{
    ensure_directory, read_json, read_to_string, remove_if_exists, write_atomic,
    write_json_atomic,
};
