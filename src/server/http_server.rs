use may::coroutine::JoinHandle;
use may_minihttp::{HttpServer as MiniHttpServer, HttpService};
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Wrapper around may_minihttp's HTTP server
///
/// Resolves the bind address up front so the returned handle knows where the
/// server is listening.
pub struct HttpServer<T>(pub T);

/// Handle to a running HTTP server
///
/// Provides methods for waiting until the server is ready, stopping it gracefully,
/// or joining the server thread.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the server was bound to
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the server to be ready to accept connections
    ///
    /// Polls the server address by attempting TCP connections until successful.
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` if the server doesn't accept a connection within
    /// ~1s (200 attempts × 5ms).
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..200 {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Stop the server
    ///
    /// Cancels the accept coroutine and waits for it to finish.
    pub fn stop(self) {
        info!(addr = %self.addr, "Stopping HTTP server");
        // SAFETY: cancel() is unsafe in may because a cancelled coroutine
        // unwinds at its next yield point. The accept loop holds no state
        // that must survive that, and the handle is owned here.
        #[allow(unsafe_code)]
        unsafe {
            self.handle.coroutine().cancel();
        }
        if self.handle.join().is_err() {
            debug!(addr = %self.addr, "Server coroutine ended by cancellation");
        }
    }

    /// Block until the server coroutine finishes
    ///
    /// # Errors
    ///
    /// Returns an error if the server coroutine panicked or was cancelled.
    pub fn join(self) -> std::thread::Result<()> {
        self.handle.join()
    }
}

impl<T: HttpService + Clone + Send + Sync + 'static> HttpServer<T> {
    /// Start the HTTP server on the given address
    ///
    /// Port `0` is not supported: the handle would not know the real port.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or the port cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;
        let handle = MiniHttpServer(self.0).start(addr)?;
        info!(%addr, "HTTP server listening");
        Ok(ServerHandle { addr, handle })
    }
}
