//! Shared startup plumbing used by both the ingress server and the egress
//! broadcaster: unlink any stale socket file, bind, and listen.

use std::io;
use std::os::unix::net::UnixListener;
use std::path::Path;

/// Remove a stale socket file (if any), bind a fresh listener at `path`, and
/// start listening. Parent directories are assumed to already exist — unlike
/// a long-running daemon's own config directory, the core does not create
/// directories on the host's behalf.
pub fn bind_unix_listener(path: &Path) -> io::Result<UnixListener> {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    UnixListener::bind(path)
}

/// Best-effort lowering of the calling thread's scheduling priority.
///
/// Failure is logged and otherwise ignored: a reader/accept thread that
/// couldn't be deprioritized still functions correctly, it just competes
/// for CPU time on equal footing with the rest of the host process.
pub fn lower_thread_priority() {
    // SAFETY: `SYS_gettid` and `setpriority` are plain syscalls with no
    // preconditions beyond the ones already satisfied by a running thread.
    let tid = unsafe { libc::syscall(libc::SYS_gettid) };
    let rc = unsafe { libc::setpriority(libc::PRIO_PROCESS, tid as libc::id_t, 10) };
    if rc != 0 {
        log::warn!(
            "failed to lower thread priority: {}",
            io::Error::last_os_error()
        );
    }
}
