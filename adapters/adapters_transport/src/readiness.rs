//! Readiness Wait Module
//!
//! Provides the bounded readiness checks used to implement timeouts over
//! otherwise blocking calls (timed accept, timed connect). On unix this is
//! a `poll(2)` on the descriptor; the wait returns whether the descriptor
//! became ready within the timeout, never how the subsequent I/O call will
//! fare.

use std::io;

use socket2::Socket as Socket2;

/// Wait until the socket is readable, bounded by `timeout_ms`
///
/// # Returns
/// * `Ok(true)` - The descriptor is ready for reading (or has a pending
///   error to collect)
/// * `Ok(false)` - The timeout elapsed first
/// * `Err(io::Error)` - The wait itself failed
#[cfg(unix)]
pub fn wait_readable(socket: &Socket2, timeout_ms: u32) -> io::Result<bool> {
    poll_wait(socket, libc::POLLIN, timeout_ms)
}

/// Wait until the socket is writable, bounded by `timeout_ms`
///
/// Used to bound a non-blocking connect: writability signals that the
/// connection attempt completed, successfully or not.
#[cfg(unix)]
pub fn wait_writable(socket: &Socket2, timeout_ms: u32) -> io::Result<bool> {
    poll_wait(socket, libc::POLLOUT, timeout_ms)
}

#[cfg(unix)]
fn poll_wait(socket: &Socket2, events: libc::c_short, timeout_ms: u32) -> io::Result<bool> {
    use std::os::unix::io::AsRawFd;

    let mut pollfd = libc::pollfd {
        fd: socket.as_raw_fd(),
        events: events | libc::POLLERR,
        revents: 0,
    };
    let timeout = timeout_ms.min(i32::MAX as u32) as libc::c_int;
    let ret = unsafe { libc::poll(&mut pollfd, 1, timeout) };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(ret > 0)
}

/// Fallback readiness wait for platforms without `poll`
///
/// Sleeps out the timeout and reports ready, leaving the retried I/O call
/// to discover the actual state.
#[cfg(not(unix))]
pub fn wait_readable(_socket: &Socket2, timeout_ms: u32) -> io::Result<bool> {
    std::thread::sleep(std::time::Duration::from_millis(u64::from(timeout_ms)));
    Ok(true)
}

#[cfg(not(unix))]
pub fn wait_writable(_socket: &Socket2, timeout_ms: u32) -> io::Result<bool> {
    std::thread::sleep(std::time::Duration::from_millis(u64::from(timeout_ms)));
    Ok(true)
}
