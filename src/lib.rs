//! Synchronous readiness waits, with cross-thread cancellation, on a single
//! raw file descriptor.
//!
//! A [`Resource`] wraps one descriptor (file, socket, pipe end, or anything
//! else identified by a `RawFd`) and lets its owner block until the descriptor
//! is ready for a read/receive or write/send operation, with an optional
//! bounded timeout. While one thread is blocked in [`Resource::wait`], any
//! other thread may call [`Resource::cancel`] to unblock it early; the
//! cancellation is delivered through a wakeup pipe created fresh for each
//! wait (the self-pipe trick), so the wrapped descriptor itself is never
//! disturbed.
//!
//! This is deliberately not an async runtime: every call waits on exactly
//! one descriptor (plus the internal wakeup pipe), on the calling thread,
//! and nothing is scheduled or multiplexed behind the scenes.
//!
//! # Readiness
//!
//! ```
//! use fdwait::{Interest, Resource};
//! use std::time::Duration;
//!
//! let mut fds = [0; 2];
//! assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
//! let reader = Resource::adopt(fds[0]);
//! let writer = Resource::adopt(fds[1]);
//!
//! // nothing to read yet
//! assert!(!reader.is_readable()?);
//!
//! unsafe { libc::write(fds[1], b"x".as_ptr() as *const _, 1) };
//!
//! // now the read end is ready
//! assert!(reader.wait(Interest::Read, Some(Duration::from_millis(100)))?);
//! # drop(writer);
//! # Ok::<(), fdwait::Error>(())
//! ```
//!
//! # Cancellation
//!
//! ```
//! use fdwait::{Interest, Resource};
//! use std::sync::Arc;
//! use std::thread;
//! use std::time::Duration;
//!
//! let mut fds = [0; 2];
//! assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
//! let reader = Arc::new(Resource::adopt(fds[0]));
//! let writer = Resource::adopt(fds[1]);
//!
//! let canceller = Arc::clone(&reader);
//! let handle = thread::spawn(move || {
//!     thread::sleep(Duration::from_millis(20));
//!     canceller.cancel();
//! });
//!
//! // nothing is ever written: only the cancel ends this wait
//! assert!(!reader.wait(Interest::Read, None)?);
//! handle.join().unwrap();
//! # drop(writer);
//! # Ok::<(), fdwait::Error>(())
//! ```

#![cfg(unix)]
#![warn(
    rust_2018_idioms,
    unreachable_pub,
    missing_debug_implementations,
    missing_docs
)]

mod error;
mod interest;
mod resource;
mod sys;

pub use crate::error::{Error, Result};
pub use crate::interest::Interest;
pub use crate::resource::Resource;
