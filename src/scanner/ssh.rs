//! SSH password prober.
//!
//! Delegates the handshake and authentication to libssh2 via the `ssh2`
//! crate. libssh2 is blocking, so each attempt runs on tokio's blocking pool
//! with every network step bounded by what is left of the probe's deadline.

use crate::error::ProbeFailure;
use crate::scanner::traits::{ProbeOutcome, Prober};
use crate::types::Credentials;
use async_trait::async_trait;
use ssh2::{ErrorCode, Session};
use std::io;
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// libssh2 `LIBSSH2_ERROR_TIMEOUT`.
const LIBSSH2_ERROR_TIMEOUT: i32 = -9;
/// libssh2 `LIBSSH2_ERROR_AUTHENTICATION_FAILED`.
const LIBSSH2_ERROR_AUTHENTICATION_FAILED: i32 = -18;
/// libssh2 `LIBSSH2_ERROR_SOCKET_TIMEOUT`.
const LIBSSH2_ERROR_SOCKET_TIMEOUT: i32 = -30;

/// Tries one username/password pair over SSH.
///
/// Host keys are not verified: the only question asked is whether the server
/// accepts the credentials.
#[derive(Debug, Clone)]
pub struct SshProber {
    credentials: Arc<Credentials>,
    timeout: Duration,
}

impl SshProber {
    /// Create a new SSH prober.
    ///
    /// # Arguments
    /// * `credentials` - Username and password tried against every target
    /// * `timeout` - Deadline for the whole attempt (connect, handshake, auth)
    pub fn new(credentials: Credentials, timeout: Duration) -> Self {
        Self {
            credentials: Arc::new(credentials),
            timeout,
        }
    }
}

#[async_trait]
impl Prober for SshProber {
    async fn probe(&self, target: SocketAddr) -> ProbeOutcome {
        self.probe_within(target, self.timeout).await
    }

    /// Runs the attempt on the blocking pool and waits for it to finish.
    ///
    /// The deadline starts once a blocking thread picks the attempt up, so
    /// time spent queued for a thread is not charged to the target. There is
    /// no outer timeout: the attempt bounds itself and its socket is closed
    /// by the time this returns.
    async fn probe_within(&self, target: SocketAddr, limit: Duration) -> ProbeOutcome {
        let credentials = Arc::clone(&self.credentials);
        let timeout = limit.min(self.timeout);

        tokio::task::spawn_blocking(move || authenticate(target, &credentials, timeout))
            .await
            .unwrap_or_else(|join_err| {
                Err(ProbeFailure::Other(format!("probe task failed: {}", join_err)))
            })
    }
}

/// Blocking connect + handshake + password auth. The session is disconnected
/// and the socket dropped before this returns.
fn authenticate(target: SocketAddr, credentials: &Credentials, timeout: Duration) -> ProbeOutcome {
    let deadline = Instant::now() + timeout;

    let stream = TcpStream::connect_timeout(&target, timeout).map_err(classify_connect_error)?;
    let remaining = remaining_until(deadline)?;
    // Best effort: libssh2's own timeout below is the authoritative bound.
    let _ = stream.set_read_timeout(Some(remaining));
    let _ = stream.set_write_timeout(Some(remaining));

    let mut session =
        Session::new().map_err(|e| ProbeFailure::Other(format!("session init: {}", e)))?;
    session.set_tcp_stream(stream);
    session.set_timeout(as_millis_u32(remaining));

    let result = handshake_and_login(&mut session, credentials, deadline);

    let _ = session.disconnect(None, "probe complete", None);
    result
}

fn handshake_and_login(
    session: &mut Session,
    credentials: &Credentials,
    deadline: Instant,
) -> ProbeOutcome {
    session.handshake().map_err(classify_ssh_error)?;

    session.set_timeout(as_millis_u32(remaining_until(deadline)?));
    match session.userauth_password(credentials.username(), credentials.password()) {
        Ok(()) if session.authenticated() => Ok(()),
        Ok(()) => Err(ProbeFailure::AuthRejected),
        Err(e) => Err(classify_ssh_error(e)),
    }
}

fn remaining_until(deadline: Instant) -> Result<Duration, ProbeFailure> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        Err(ProbeFailure::Timeout)
    } else {
        Ok(remaining)
    }
}

/// libssh2 treats 0 as "no timeout", so never hand it a zero.
fn as_millis_u32(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX).max(1)
}

fn classify_connect_error(err: io::Error) -> ProbeFailure {
    match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ProbeFailure::Timeout,
        _ => ProbeFailure::Unreachable(err.to_string()),
    }
}

fn classify_ssh_error(err: ssh2::Error) -> ProbeFailure {
    match err.code() {
        ErrorCode::Session(LIBSSH2_ERROR_TIMEOUT)
        | ErrorCode::Session(LIBSSH2_ERROR_SOCKET_TIMEOUT) => ProbeFailure::Timeout,
        ErrorCode::Session(LIBSSH2_ERROR_AUTHENTICATION_FAILED) => ProbeFailure::AuthRejected,
        _ => ProbeFailure::Other(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{ScanConfig, ScanJob};
    use crate::types::Port;
    use std::io::{Read, Write};
    use std::net::{IpAddr, Ipv4Addr, TcpListener};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    fn prober(timeout_ms: u64) -> SshProber {
        SshProber::new(
            Credentials::new("test", "123456"),
            Duration::from_millis(timeout_ms),
        )
    }

    #[test]
    fn test_classify_connect_error() {
        let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        assert!(matches!(
            classify_connect_error(refused),
            ProbeFailure::Unreachable(_)
        ));

        let timed_out = io::Error::new(io::ErrorKind::TimedOut, "timed out");
        assert_eq!(classify_connect_error(timed_out), ProbeFailure::Timeout);
    }

    #[test]
    fn test_millis_never_zero() {
        assert_eq!(as_millis_u32(Duration::from_micros(10)), 1);
        assert_eq!(as_millis_u32(Duration::from_secs(3)), 3000);
        assert_eq!(as_millis_u32(Duration::from_secs(u64::MAX)), u32::MAX);
    }

    #[test]
    fn test_expired_deadline_is_timeout() {
        let past = Instant::now() - Duration::from_millis(5);
        assert_eq!(remaining_until(past), Err(ProbeFailure::Timeout));
    }

    #[tokio::test]
    async fn test_closed_port_is_unreachable() {
        // Bind then drop to get a local port with nothing listening.
        let port = {
            let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
            listener.local_addr().unwrap().port()
        };
        let target = SocketAddr::from((Ipv4Addr::LOCALHOST, port));

        let result = prober(500).probe(target).await;
        assert!(matches!(
            result,
            Err(ProbeFailure::Unreachable(_)) | Err(ProbeFailure::Timeout)
        ));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        // Accepts the TCP connection but never sends an SSH banner.
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let target = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            std::thread::sleep(Duration::from_millis(600));
            drop(stream);
        });

        let started = Instant::now();
        let result = prober(200).probe(target).await;
        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_millis(550));
        server.join().unwrap();
    }

    #[tokio::test]
    async fn test_non_ssh_server_fails() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let target = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let _ = stream.write_all(b"HTTP/1.1 400 Bad Request\r\n\r\n");
        });

        let result = prober(1000).probe(target).await;
        assert!(result.is_err());
        server.join().unwrap();
    }

    #[test]
    fn test_queued_attempts_finish_before_scan_returns() {
        // Holds every connection open without ever sending a banner.
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        listener.set_nonblocking(true).unwrap();
        let port = listener.local_addr().unwrap().port();
        let accepted = Arc::new(Mutex::new(Vec::<TcpStream>::new()));
        let stop = Arc::new(AtomicBool::new(false));
        let server = {
            let accepted = Arc::clone(&accepted);
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                while !stop.load(Ordering::SeqCst) {
                    match listener.accept() {
                        Ok((stream, _)) => accepted.lock().unwrap().push(stream),
                        Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                            std::thread::sleep(Duration::from_millis(2));
                        }
                        Err(e) => panic!("accept failed: {}", e),
                    }
                }
            })
        };

        // Fewer blocking threads than workers, so most attempts start queued.
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .max_blocking_threads(2)
            .enable_all()
            .build()
            .unwrap();

        let timeout = Duration::from_millis(300);
        let config = ScanConfig::new(Port::new(port).unwrap())
            .with_concurrency(8)
            .with_timeout(timeout);
        let summary = runtime.block_on(async {
            let (tx, rx) = mpsc::channel(8);
            for _ in 0..8 {
                tx.send(IpAddr::from(Ipv4Addr::LOCALHOST)).await.unwrap();
            }
            drop(tx);
            ScanJob::new(config, Arc::new(prober(300)))
                .run_feed(rx, 8)
                .await
                .unwrap()
        });

        assert_eq!(summary.attempted, 8);
        assert_eq!(summary.failed, 8);
        // Two threads, eight attempts: four full rounds, none cut short by queueing.
        assert!(summary.elapsed >= timeout * 3, "took {:?}", summary.elapsed);

        // Let the accept loop drain the backlog the kernel already completed.
        std::thread::sleep(Duration::from_millis(50));
        let at_return = accepted.lock().unwrap().len();
        std::thread::sleep(Duration::from_millis(600));
        let later = accepted.lock().unwrap().len();
        assert_eq!(at_return, 8);
        assert_eq!(later, 8, "connections opened after the scan returned");

        // Every client side is already closed: reads reach EOF instead of blocking.
        for stream in accepted.lock().unwrap().iter_mut() {
            stream.set_nonblocking(false).unwrap();
            stream
                .set_read_timeout(Some(Duration::from_millis(500)))
                .unwrap();
            let mut sink = Vec::new();
            assert!(stream.read_to_end(&mut sink).is_ok());
        }

        stop.store(true, Ordering::SeqCst);
        server.join().unwrap();
    }
}
