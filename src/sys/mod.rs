//! Thin shims over the unix primitives the crate consumes: signaling-pipe
//! creation, `close(2)`, `poll(2)` and its timeout encoding, and the
//! one-byte wakeup write.

use std::cmp;
use std::io;
use std::os::unix::io::RawFd;
use std::time::Duration;

use libc::{self, c_int};
use log::trace;

/*
 *
 * ===== errno conversion =====
 *
 */

trait IsMinusOne {
    fn is_minus_one(&self) -> bool;
}

impl IsMinusOne for i32 {
    fn is_minus_one(&self) -> bool {
        *self == -1
    }
}
impl IsMinusOne for isize {
    fn is_minus_one(&self) -> bool {
        *self == -1
    }
}

fn cvt<T: IsMinusOne>(t: T) -> io::Result<T> {
    if t.is_minus_one() {
        Err(io::Error::last_os_error())
    } else {
        Ok(t)
    }
}

/*
 *
 * ===== signaling pipe =====
 *
 */

/// A connected pair of pipe ends, non-blocking and cloexec. Both ends are
/// closed on drop, so holding one across a `poll` call guarantees release
/// on every exit path.
#[derive(Debug)]
pub(crate) struct Pipe {
    pub(crate) read: RawFd,
    pub(crate) write: RawFd,
}

impl Drop for Pipe {
    fn drop(&mut self) {
        let _ = close(self.read);
        let _ = close(self.write);
    }
}

#[cfg(target_os = "linux")]
pub(crate) fn pipe() -> io::Result<Pipe> {
    let mut fds = [0; 2];
    cvt(unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_NONBLOCK | libc::O_CLOEXEC) })?;
    Ok(Pipe {
        read: fds[0],
        write: fds[1],
    })
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn pipe() -> io::Result<Pipe> {
    let mut fds = [0; 2];
    cvt(unsafe { libc::pipe(fds.as_mut_ptr()) })?;

    // Ensure the ends are closed if any of the fcntl calls below fail.
    let p = Pipe {
        read: fds[0],
        write: fds[1],
    };
    set_cloexec(p.read)?;
    set_cloexec(p.write)?;
    set_nonblock(p.read)?;
    set_nonblock(p.write)?;
    Ok(p)
}

pub(crate) fn set_nonblock(fd: c_int) -> io::Result<()> {
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL);
        cvt(libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK)).map(|_| ())
    }
}

#[cfg(not(target_os = "linux"))]
fn set_cloexec(fd: c_int) -> io::Result<()> {
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFD);
        cvt(libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC)).map(|_| ())
    }
}

pub(crate) fn close(fd: RawFd) -> io::Result<()> {
    cvt(unsafe { libc::close(fd) }).map(|_| ())
}

/*
 *
 * ===== poll(2) =====
 *
 */

pub(crate) fn poll(fds: &mut [libc::pollfd], timeout: c_int) -> io::Result<usize> {
    cvt(unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout) })
        .map(|n| n as usize)
}

/// Encode an optional duration as the `poll(2)` millisecond argument:
/// `None` maps to the -1 "block forever" sentinel, sub-millisecond
/// remainders round up so short timeouts are never turned into busy polls.
pub(crate) fn poll_timeout(timeout: Option<Duration>) -> c_int {
    match timeout {
        None => -1,
        Some(d) => {
            let mut millis = d.as_millis();
            if d.subsec_nanos() % 1_000_000 != 0 {
                millis += 1;
            }
            cmp::min(millis, libc::c_int::max_value() as u128) as c_int
        }
    }
}

/// Write the single wakeup byte to a published wake end. Failure is
/// irrelevant here: a full pipe (WouldBlock) means a wakeup is already
/// pending, and any other failure means the wait is no longer listening.
pub(crate) fn wake(fd: RawFd) {
    let res = cvt(unsafe { libc::write(fd, b"\x01".as_ptr() as *const libc::c_void, 1) });
    if let Err(err) = res {
        if err.kind() != io::ErrorKind::WouldBlock {
            trace!("wakeup write to fd {} failed: {}", fd, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipe_ends_are_nonblocking_and_cloexec() {
        let p = pipe().unwrap();
        for &fd in &[p.read, p.write] {
            let fl = unsafe { libc::fcntl(fd, libc::F_GETFL) };
            assert!(fl & libc::O_NONBLOCK != 0);
            let fd_flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
            assert!(fd_flags & libc::FD_CLOEXEC != 0);
        }
    }

    #[test]
    fn pipe_drop_closes_both_ends() {
        let (read, write) = {
            let p = pipe().unwrap();
            (p.read, p.write)
        };
        assert_eq!(unsafe { libc::fcntl(read, libc::F_GETFD) }, -1);
        assert_eq!(unsafe { libc::fcntl(write, libc::F_GETFD) }, -1);
    }

    #[test]
    fn timeout_encoding() {
        assert_eq!(poll_timeout(None), -1);
        assert_eq!(poll_timeout(Some(Duration::from_millis(0))), 0);
        assert_eq!(poll_timeout(Some(Duration::from_millis(50))), 50);
        // sub-millisecond remainders round up
        assert_eq!(poll_timeout(Some(Duration::from_micros(1_500))), 2);
        assert_eq!(poll_timeout(Some(Duration::from_nanos(1))), 1);
        // absurd durations clamp instead of wrapping
        assert_eq!(
            poll_timeout(Some(Duration::from_secs(u64::max_value()))),
            libc::c_int::max_value()
        );
    }

    #[test]
    fn wake_tolerates_full_pipe() {
        let p = pipe().unwrap();
        let buf = [0u8; 4096];
        loop {
            let rc =
                unsafe { libc::write(p.write, buf.as_ptr() as *const libc::c_void, buf.len()) };
            if rc == -1 {
                break;
            }
        }
        // pipe buffer is full; the wakeup write hits WouldBlock and is dropped
        wake(p.write);
    }
}
