use libc::c_short;

/// The I/O direction a readiness wait is interested in.
///
/// `Read` covers both ordinary input and urgent/out-of-band data: a
/// descriptor with pending urgent data can be read without blocking, so the
/// priority condition is folded into read readiness rather than exposed as
/// a third kind.
///
/// # Examples
///
/// ```
/// use fdwait::Interest;
///
/// assert_ne!(Interest::Read, Interest::Write);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    /// Readiness for a read/receive operation.
    Read,
    /// Readiness for a write/send operation.
    Write,
}

impl Interest {
    /// The `poll(2)` event mask registering this interest.
    pub(crate) fn events(self) -> c_short {
        match self {
            Interest::Read => libc::POLLIN | libc::POLLPRI,
            Interest::Write => libc::POLLOUT,
        }
    }

    /// Whether a returned `revents` mask satisfies this interest.
    #[inline]
    pub(crate) fn satisfied_by(self, revents: c_short) -> bool {
        revents & self.events() != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_folds_in_priority() {
        let ev = Interest::Read.events();
        assert!(ev & libc::POLLIN != 0);
        assert!(ev & libc::POLLPRI != 0);
        assert!(ev & libc::POLLOUT == 0);
    }

    #[test]
    fn write_is_pollout_only() {
        assert_eq!(Interest::Write.events(), libc::POLLOUT);
    }

    #[test]
    fn satisfied_by_matching_revents() {
        assert!(Interest::Read.satisfied_by(libc::POLLIN));
        assert!(Interest::Read.satisfied_by(libc::POLLPRI));
        assert!(Interest::Write.satisfied_by(libc::POLLOUT));

        // hangup alone satisfies neither direction
        assert!(!Interest::Read.satisfied_by(libc::POLLHUP));
        assert!(!Interest::Write.satisfied_by(libc::POLLHUP));
    }
}
