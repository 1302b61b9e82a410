//! The local endpoint the agent listens on: a UNIX-domain socket on
//! POSIX, a Named Pipe on Windows, behind one small capability so the
//! frontend's accept loop doesn't need to know which.

#[cfg(unix)]
pub use unix::Endpoint;
#[cfg(windows)]
pub use windows::Endpoint;

#[cfg(unix)]
mod unix {
    use std::fs;
    use std::io;
    use std::os::unix::fs::PermissionsExt;
    use std::os::unix::net::{UnixListener, UnixStream};
    use std::path::PathBuf;

    /// A bound UNIX-domain socket, restricted to the current user and
    /// removed from the filesystem on drop.
    pub struct Endpoint {
        listener: UnixListener,
        path: PathBuf,
    }

    impl Endpoint {
        pub fn bind(path: &str) -> io::Result<Self> {
            let path = PathBuf::from(path);
            if path.exists() {
                return Err(io::Error::new(
                    io::ErrorKind::AddrInUse,
                    format!("{} already exists", path.display()),
                ));
            }
            let listener = UnixListener::bind(&path)?;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
            Ok(Endpoint { listener, path })
        }

        pub fn accept(&self) -> io::Result<UnixStream> {
            self.listener.accept().map(|(stream, _)| stream)
        }
    }

    impl Drop for Endpoint {
        fn drop(&mut self) {
            let _ = fs::remove_file(&self.path);
        }
    }
}

#[cfg(windows)]
mod windows {
    use std::io;

    use named_pipe::{ConnectedServer, PipeOptions};

    // Grants access to authenticated users only, mirroring the ACL the
    // agent this was modeled on applies to its pipe.
    const SECURITY_DESCRIPTOR: &str = "D:P(A;;GA;;;AU)";

    /// A Windows Named Pipe. Each accepted connection re-creates the
    /// server side for the next client, matching how `named_pipe`
    /// models a pipe instance.
    pub struct Endpoint {
        path: String,
    }

    impl Endpoint {
        pub fn bind(path: &str) -> io::Result<Self> {
            Ok(Endpoint {
                path: path.to_string(),
            })
        }

        pub fn accept(&self) -> io::Result<ConnectedServer> {
            PipeOptions::new(&self.path)
                .security_descriptor(SECURITY_DESCRIPTOR)
                .single()?
                .wait()
        }
    }
}
