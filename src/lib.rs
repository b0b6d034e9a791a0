#![deny(missing_docs)]
#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![warn(clippy::unwrap_used)]
#![warn(rust_2018_idioms, unused_lifetimes, missing_debug_implementations)]

//! Crate for a writer that prefixes every line written to it, even when
//! lines are split over multiple writes or a write contains multiple
//! lines.
//!
//! ```
//! use std::io::Write;
//!
//! use indent_writer::PrefixWriter;
//!
//! let mut buffer = Vec::new();
//! {
//!     let mut writer = PrefixWriter::new(&mut buffer, "> ");
//!     writer.write_all(b"line 1\nline 2\nline 3\n")?;
//! }
//!
//! assert_eq!(b"> line 1\n> line 2\n> line 3\n", &buffer[..]);
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! Writers nest and the prefixes add up. Nesting does not stack another
//! layer of forwarding, every handle of a chain writes straight to the
//! same sink:
//!
//! ```
//! use std::io::Write;
//!
//! use indent_writer::PrefixWriter;
//!
//! let mut buffer = Vec::new();
//! {
//!     let mut outer = PrefixWriter::new(&mut buffer, "> ");
//!     writeln!(outer, "line 1")?;
//!     writeln!(outer.nest(".."), "line 2")?;
//!     writeln!(outer, "line 3")?;
//! }
//!
//! assert_eq!("> line 1\n> ..line 2\n> line 3\n", String::from_utf8_lossy(&buffer));
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! [`prefix_str`] and [`prefix_bytes`] do the same for input that is
//! already in memory.

mod error;
mod prefix_writer;
mod transform;

pub use error::Error;
pub use prefix_writer::PrefixWriter;
pub use transform::{
    prefix_bytes,
    prefix_lines,
    prefix_str,
};
