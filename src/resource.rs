use std::os::unix::io::{AsRawFd, FromRawFd, IntoRawFd, RawFd};
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::{Duration, Instant};

use log::trace;

use crate::error::{Error, Result};
use crate::interest::Interest;
use crate::sys;

const INVALID: RawFd = -1;

/// A descriptor-backed OS resource (file, socket, pipe end) that can be
/// waited on for read or write readiness, with an optional timeout, and
/// whose in-flight wait can be cancelled from another thread.
///
/// # Ownership
///
/// A `Resource` either *adopts* its descriptor ([`Resource::adopt`],
/// [`FromRawFd`]) and closes it exactly once when dropped or explicitly
/// [`close`]d, or merely *borrows* it ([`Resource::borrowed`]) and never
/// closes it. Moving a `Resource` transfers the descriptor and its
/// ownership; [`IntoRawFd`] hands the descriptor back without closing.
///
/// # Waiting and cancellation
///
/// [`wait`] blocks on a two-entry `poll(2)` set: the wrapped descriptor
/// plus the read end of a wakeup pipe created fresh for that one call. The
/// pipe's write end is published in an atomic slot for exactly the duration
/// of the poll, so [`cancel`] from any other thread either reaches a live
/// wake end (and unblocks the wait promptly) or finds no wait in progress
/// and does nothing. Cancellation never touches the wrapped descriptor.
///
/// At most one wait may be outstanding per instance; `cancel` is the only
/// operation that is safe to call concurrently with it. `Resource` is
/// `Send + Sync`, so an `Arc<Resource>` shared with a cancelling thread is
/// the intended pattern.
///
/// # Examples
///
/// ```
/// use fdwait::{Interest, Resource};
/// use std::time::Duration;
///
/// let mut fds = [0; 2];
/// assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
/// let reader = Resource::adopt(fds[0]);
/// let writer = Resource::adopt(fds[1]);
///
/// // nothing written yet
/// assert!(!reader.is_readable()?);
///
/// // the pipe buffer is empty, so the write end is ready
/// assert!(writer.is_writable()?);
///
/// unsafe { libc::write(fds[1], b"x".as_ptr() as *const _, 1) };
/// assert!(reader.wait(Interest::Read, Some(Duration::from_millis(100)))?);
/// # Ok::<(), fdwait::Error>(())
/// ```
///
/// [`close`]: Resource::close
/// [`wait`]: Resource::wait
/// [`cancel`]: Resource::cancel
#[derive(Debug)]
pub struct Resource {
    fd: RawFd,
    owned: bool,
    waker: AtomicI32,
}

impl Resource {
    /// An empty resource holding no descriptor. Every operation other than
    /// [`cancel`](Resource::cancel) fails on it with
    /// [`Error::InvalidState`].
    pub fn empty() -> Resource {
        Resource {
            fd: INVALID,
            owned: false,
            waker: AtomicI32::new(INVALID),
        }
    }

    /// Wrap `fd`, taking responsibility for closing it. A negative `fd`
    /// yields an empty resource.
    pub fn adopt(fd: RawFd) -> Resource {
        if fd < 0 {
            return Resource::empty();
        }
        Resource {
            fd,
            owned: true,
            waker: AtomicI32::new(INVALID),
        }
    }

    /// Wrap `fd` without taking ownership: the caller remains responsible
    /// for closing it, and dropping the resource releases nothing. A
    /// negative `fd` yields an empty resource.
    pub fn borrowed(fd: RawFd) -> Resource {
        if fd < 0 {
            return Resource::empty();
        }
        Resource {
            fd,
            owned: false,
            waker: AtomicI32::new(INVALID),
        }
    }

    /// Whether this resource holds no descriptor.
    pub fn is_empty(&self) -> bool {
        self.fd == INVALID
    }

    /// Whether this resource will close its descriptor on drop.
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    /// Release the descriptor and leave the resource empty.
    ///
    /// Ownership, not mere presence, gates the actual `close(2)`: on a
    /// borrowed resource this only detaches the descriptor and succeeds.
    /// Fails with [`Error::InvalidState`] when already empty, including on
    /// a second `close`.
    pub fn close(&mut self) -> Result<()> {
        if self.fd == INVALID {
            return Err(Error::InvalidState);
        }
        let fd = self.fd;
        self.fd = INVALID;
        let owned = std::mem::replace(&mut self.owned, false);
        if owned {
            sys::close(fd).map_err(Error::Close)?;
        }
        Ok(())
    }

    /// Put the descriptor into non-blocking mode.
    pub fn set_nonblock(&self) -> Result<()> {
        if self.fd == INVALID {
            return Err(Error::InvalidState);
        }
        sys::set_nonblock(self.fd).map_err(Error::Fcntl)
    }

    /// Block until the descriptor is ready for `interest`, the wait is
    /// [`cancel`](Resource::cancel)led, or `timeout` elapses.
    ///
    /// `None` blocks indefinitely; `Some(Duration::from_millis(0))` is an
    /// immediate poll. Returns `Ok(true)` iff the *descriptor* satisfied
    /// the requested interest: cancellation and timeout both return
    /// `Ok(false)` and are indistinguishable here. A failing `poll(2)`
    /// (including `EINTR`; no retry is performed) surfaces as
    /// [`Error::Poll`] after the wakeup pipe has been torn down.
    pub fn wait(&self, interest: Interest, timeout: Option<Duration>) -> Result<bool> {
        if self.fd == INVALID {
            return Err(Error::InvalidState);
        }

        // Fresh wakeup pipe for this call only; both ends close when
        // `pipe` drops, on every path out of this function.
        let pipe = sys::pipe().map_err(Error::Pipe)?;

        let mut fds = [
            libc::pollfd {
                fd: self.fd,
                events: interest.events(),
                revents: 0,
            },
            libc::pollfd {
                fd: pipe.read,
                events: libc::POLLIN,
                revents: 0,
            },
        ];

        trace!(
            "fd {}: waiting for {:?}, timeout {:?}",
            self.fd,
            interest,
            timeout
        );

        // The wake end is visible to cancel() for exactly the duration of
        // the poll call.
        self.waker.store(pipe.write, Ordering::Release);
        let polled = sys::poll(&mut fds, sys::poll_timeout(timeout));
        self.waker.store(INVALID, Ordering::Release);

        match polled {
            Ok(_) => {
                let ready = interest.satisfied_by(fds[0].revents);
                trace!("fd {}: wait done, ready = {}", self.fd, ready);
                Ok(ready)
            }
            Err(err) => Err(Error::Poll(err)),
        }
    }

    /// `wait(interest, ..)` against an absolute deadline. A deadline in the
    /// past degrades to an immediate poll, never to a negative timeout.
    pub fn wait_deadline(&self, interest: Interest, deadline: Instant) -> Result<bool> {
        self.wait(
            interest,
            Some(deadline.saturating_duration_since(Instant::now())),
        )
    }

    /// Immediate poll: is the descriptor ready for reading right now?
    pub fn is_readable(&self) -> Result<bool> {
        self.wait(Interest::Read, Some(Duration::from_millis(0)))
    }

    /// Immediate poll: is the descriptor ready for writing right now?
    pub fn is_writable(&self) -> Result<bool> {
        self.wait(Interest::Write, Some(Duration::from_millis(0)))
    }

    /// [`wait`](Resource::wait) for read readiness.
    pub fn wait_readable(&self, timeout: Option<Duration>) -> Result<bool> {
        self.wait(Interest::Read, timeout)
    }

    /// [`wait`](Resource::wait) for write readiness.
    pub fn wait_writable(&self, timeout: Option<Duration>) -> Result<bool> {
        self.wait(Interest::Write, timeout)
    }

    /// Unblock an in-flight [`wait`](Resource::wait), usually from another
    /// thread.
    ///
    /// If a wait has published its wake end, one signal byte is written to
    /// it and that wait returns `Ok(false)` promptly; otherwise this is a
    /// no-op. Never blocks or fails, and leaves the wrapped descriptor
    /// untouched. This is the only operation that may run concurrently
    /// with a wait on the same instance.
    pub fn cancel(&self) {
        let wake = self.waker.load(Ordering::Acquire);
        if wake != INVALID {
            trace!("fd {}: cancelling in-flight wait", self.fd);
            sys::wake(wake);
        }
    }
}

impl Drop for Resource {
    fn drop(&mut self) {
        if self.owned && self.fd != INVALID {
            // drop must not fail; a close error has nowhere to go
            let _ = sys::close(self.fd);
        }
    }
}

impl AsRawFd for Resource {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl IntoRawFd for Resource {
    /// Relinquish the descriptor without closing it.
    fn into_raw_fd(self) -> RawFd {
        let fd = self.fd;
        std::mem::forget(self);
        fd
    }
}

impl FromRawFd for Resource {
    /// Equivalent to [`Resource::adopt`]; unsafe per the trait contract
    /// because the caller asserts `fd` is open and not closed elsewhere.
    unsafe fn from_raw_fd(fd: RawFd) -> Resource {
        Resource::adopt(fd)
    }
}
