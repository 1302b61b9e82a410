//! Concrete `UssProvider` implementations for the two non-default USS
//! acquisition modes the command line exposes.

use std::fs;
use std::io::{self, Read, Write};

use hwkey_proto::Udi;
use hwkey_session::UssProvider;

/// Reads the USS from a file, or from stdin when the path is `-`. The
/// full contents are hashed unmodified; nothing is trimmed.
pub struct FileUssProvider {
    path: String,
}

impl FileUssProvider {
    pub fn new(path: impl Into<String>) -> Self {
        FileUssProvider { path: path.into() }
    }

    fn read(&self) -> io::Result<Vec<u8>> {
        if self.path == "-" {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        } else {
            fs::read(&self.path)
        }
    }
}

impl UssProvider for FileUssProvider {
    fn acquire(&mut self, _udi: &Udi) -> Option<Vec<u8>> {
        match self.read() {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::error!("could not read USS from {}: {e}", self.path);
                None
            }
        }
    }
}

/// Prompts on stdin for a phrase to hash as the USS. A single visible
/// line read, not the double-entry hidden-input prompt a terminal UI
/// would give the user; that richer prompt is an external collaborator
/// this seam is built to accept.
pub struct InteractiveUssProvider;

impl UssProvider for InteractiveUssProvider {
    fn acquire(&mut self, _udi: &Udi) -> Option<Vec<u8>> {
        print!("Enter a phrase to use as the User Supplied Secret: ");
        if io::stdout().flush().is_err() {
            return None;
        }
        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(_) => Some(line.trim_end_matches(['\n', '\r']).as_bytes().to_vec()),
            Err(e) => {
                log::error!("could not read USS phrase: {e}");
                None
            }
        }
    }
}
