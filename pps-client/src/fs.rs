//! Filesystem-backed PPS transport
//!
//! On QNX, PPS objects live under `/pps` and behave like files: every
//! `read()` returns one complete change set and every `write()` publishes
//! one change. Delta delivery is requested by appending the `?delta` open
//! option to the path. Objects are opened without `?wait`, so a read with
//! nothing new fails with `EAGAIN`; the handle then sleeps for
//! [`POLL_INTERVAL`] and reports an empty batch.
//!
//! [`FsTransport::mirrored`] maps the same paths below a plain directory.
//! Mirrored objects are ordinary files: a read returns the whole file once
//! and then reports end of stream, and writes are appended.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::PathBuf;

use crate::codec::{self, Attributes, PpsMessage};
use crate::error::PpsError;
use crate::transport::{FileMode, PpsHandle, PpsMode, PpsTransport, POLL_INTERVAL};

/// PPS reads larger than this are truncated by the PPS server anyway
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Opens PPS objects through the filesystem
#[derive(Debug, Clone, Default)]
pub struct FsTransport {
    root: Option<PathBuf>,
}

impl FsTransport {
    /// Transport for a live PPS server (paths used verbatim)
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Transport over a directory that mirrors the `/pps` tree
    pub fn mirrored(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &str, mode: PpsMode) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path.trim_start_matches('/')),
            None if mode == PpsMode::Delta => PathBuf::from(format!("{}?delta", path)),
            None => PathBuf::from(path),
        }
    }
}

impl PpsTransport for FsTransport {
    fn open(
        &self,
        path: &str,
        mode: PpsMode,
        access: FileMode,
    ) -> Result<Box<dyn PpsHandle>, PpsError> {
        let resolved = self.resolve(path, mode);
        let mirrored = self.root.is_some();

        let mut options = OpenOptions::new();
        options.read(access.can_read());
        if access.can_write() {
            if mirrored {
                options.append(true).create(true);
            } else {
                options.write(true);
            }
        }

        if mirrored && access.can_write() {
            if let Some(parent) = resolved.parent() {
                fs::create_dir_all(parent).map_err(|source| PpsError::Open {
                    path: path.to_string(),
                    source,
                })?;
            }
        }

        let file = options.open(&resolved).map_err(|source| PpsError::Open {
            path: path.to_string(),
            source,
        })?;

        tracing::debug!("Opened PPS object {} ({:?}, {:?})", resolved.display(), mode, access);

        Ok(Box::new(FsHandle {
            file,
            path: path.to_string(),
            access,
            mirrored,
            exhausted: false,
        }))
    }
}

struct FsHandle {
    file: File,
    path: String,
    access: FileMode,
    mirrored: bool,
    exhausted: bool,
}

impl FsHandle {
    fn io_error(&self, source: std::io::Error) -> PpsError {
        PpsError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl PpsHandle for FsHandle {
    fn path(&self) -> &str {
        &self.path
    }

    fn read(&mut self) -> Result<Option<Vec<PpsMessage>>, PpsError> {
        if !self.access.can_read() {
            return Err(PpsError::AccessDenied {
                path: self.path.clone(),
                operation: "reading",
            });
        }

        let text = if self.mirrored {
            if self.exhausted {
                return Ok(None);
            }
            let mut text = String::new();
            self.file
                .read_to_string(&mut text)
                .map_err(|e| self.io_error(e))?;
            self.exhausted = true;
            text
        } else {
            let mut buf = vec![0u8; READ_BUFFER_SIZE];
            let n = loop {
                match self.file.read(&mut buf) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        std::thread::sleep(POLL_INTERVAL);
                        return Ok(Some(Vec::new()));
                    }
                    Err(e) => return Err(self.io_error(e)),
                }
            };
            if n == 0 {
                return Ok(None);
            }
            String::from_utf8_lossy(&buf[..n]).into_owned()
        };

        tracing::trace!("PPS read from {}: {:?}", self.path, text);
        Ok(Some(codec::decode(&text)))
    }

    fn write(&mut self, attributes: &Attributes) -> Result<(), PpsError> {
        if !self.access.can_write() {
            return Err(PpsError::AccessDenied {
                path: self.path.clone(),
                operation: "writing",
            });
        }

        let text = codec::encode(attributes);
        tracing::trace!("PPS write to {}: {:?}", self.path, text);
        self.file
            .write_all(text.as_bytes())
            .map_err(|e| self.io_error(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_native_delta_appends_option() {
        let transport = FsTransport::new();
        assert_eq!(
            transport.resolve("/pps/services/bluetooth/status", PpsMode::Delta),
            PathBuf::from("/pps/services/bluetooth/status?delta")
        );
        assert_eq!(
            transport.resolve("/pps/services/bluetooth/status", PpsMode::Full),
            PathBuf::from("/pps/services/bluetooth/status")
        );
    }

    #[test]
    fn test_resolve_mirrored_strips_leading_slash() {
        let transport = FsTransport::mirrored("/tmp/mirror");
        assert_eq!(
            transport.resolve("/pps/services/bluetooth/control", PpsMode::Delta),
            PathBuf::from("/tmp/mirror/pps/services/bluetooth/control")
        );
    }
}
