//! File-like receivers and open modes.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;
use std::str::FromStr;

/// How a file argument opens its target, after C `fopen` modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// `r`: read an existing file.
    Read,
    /// `r+`: read and write an existing file.
    ReadUpdate,
    /// `w`: create or truncate, then write.
    Write,
    /// `w+`: create or truncate, then read and write.
    WriteUpdate,
    /// `a`: create if needed, then append.
    Append,
    /// `a+`: create if needed, then read and append.
    AppendUpdate,
}

impl OpenMode {
    /// `true` for `r` and `r+`, where `-` means standard input.
    pub fn is_read_prefixed(self) -> bool {
        matches!(self, Self::Read | Self::ReadUpdate)
    }

    /// `true` for `w` and `w+`, where `-` means standard output.
    pub fn is_write_prefixed(self) -> bool {
        matches!(self, Self::Write | Self::WriteUpdate)
    }

    fn options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        match self {
            Self::Read => options.read(true),
            Self::ReadUpdate => options.read(true).write(true),
            Self::Write => options.write(true).create(true).truncate(true),
            Self::WriteUpdate => options.read(true).write(true).create(true).truncate(true),
            Self::Append => options.append(true).create(true),
            Self::AppendUpdate => options.read(true).append(true).create(true),
        };
        options
    }

    /// Opens `path`, mapping `-` to a standard stream for `r`/`w` modes.
    ///
    /// File arguments call this in the end phase of a parse; callers that
    /// must defer opening until later can call it themselves.
    pub fn open(self, path: &str) -> io::Result<FileHandle> {
        if path == "-" {
            if self.is_read_prefixed() {
                return Ok(FileHandle::Stdin(io::stdin()));
            }
            if self.is_write_prefixed() {
                return Ok(FileHandle::Stdout(io::stdout()));
            }
        }
        self.options().open(Path::new(path)).map(FileHandle::File)
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self {
            Self::Read => "r",
            Self::ReadUpdate => "r+",
            Self::Write => "w",
            Self::WriteUpdate => "w+",
            Self::Append => "a",
            Self::AppendUpdate => "a+",
        };
        f.write_str(mode)
    }
}

impl FromStr for OpenMode {
    type Err = String;

    /// Parses `fopen`-style modes; a `b` anywhere after the first letter is
    /// accepted and ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mode: String = s
            .chars()
            .enumerate()
            .filter(|&(i, c)| i == 0 || c != 'b')
            .map(|(_, c)| c)
            .collect();
        match mode.as_str() {
            "r" => Ok(Self::Read),
            "r+" => Ok(Self::ReadUpdate),
            "w" => Ok(Self::Write),
            "w+" => Ok(Self::WriteUpdate),
            "a" => Ok(Self::Append),
            "a+" => Ok(Self::AppendUpdate),
            _ => Err(format!("unknown open mode '{s}'")),
        }
    }
}

/// The receiver of a file argument.
///
/// Stays [`NotOpen`](FileHandle::NotOpen) when no path was supplied and no
/// default applies, or when a soft-error open failed.
#[derive(Debug, Default)]
pub enum FileHandle {
    #[default]
    NotOpen,
    Stdin(io::Stdin),
    Stdout(io::Stdout),
    File(File),
}

impl FileHandle {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::NotOpen)
    }

    pub fn is_stdin(&self) -> bool {
        matches!(self, Self::Stdin(_))
    }

    pub fn is_stdout(&self) -> bool {
        matches!(self, Self::Stdout(_))
    }

    fn unsupported(direction: &str) -> io::Error {
        io::Error::new(
            io::ErrorKind::Unsupported,
            format!("file handle is not open for {direction}"),
        )
    }
}

impl Read for FileHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Stdin(stdin) => stdin.read(buf),
            Self::File(file) => file.read(buf),
            Self::NotOpen | Self::Stdout(_) => Err(Self::unsupported("reading")),
        }
    }
}

impl Write for FileHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Stdout(stdout) => stdout.write(buf),
            Self::File(file) => file.write(buf),
            Self::NotOpen | Self::Stdin(_) => Err(Self::unsupported("writing")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Stdout(stdout) => stdout.flush(),
            Self::File(file) => file.flush(),
            Self::NotOpen | Self::Stdin(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dash_maps_to_standard_streams() {
        assert!(OpenMode::Read.open("-").unwrap().is_stdin());
        assert!(OpenMode::ReadUpdate.open("-").unwrap().is_stdin());
        assert!(OpenMode::Write.open("-").unwrap().is_stdout());
        assert!(OpenMode::WriteUpdate.open("-").unwrap().is_stdout());
    }

    #[test]
    fn test_open_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let path = path.to_str().unwrap();

        let mut handle = OpenMode::Write.open(path).unwrap();
        handle.write_all(b"hello").unwrap();
        drop(handle);

        let mut handle = OpenMode::Read.open(path).unwrap();
        let mut text = String::new();
        handle.read_to_string(&mut text).unwrap();
        assert_eq!(text, "hello");
    }

    #[test]
    fn test_open_missing_file_for_read_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        assert!(OpenMode::Read.open(path.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_not_open_rejects_io() {
        let mut handle = FileHandle::NotOpen;
        assert!(!handle.is_open());
        assert!(handle.write(b"x").is_err());
        let mut buf = [0u8; 4];
        assert!(handle.read(&mut buf).is_err());
    }

    #[test]
    fn test_parse_open_mode() {
        assert_eq!("r".parse::<OpenMode>(), Ok(OpenMode::Read));
        assert_eq!("rb+".parse::<OpenMode>(), Ok(OpenMode::ReadUpdate));
        assert_eq!("a+b".parse::<OpenMode>(), Ok(OpenMode::AppendUpdate));
        assert_eq!(OpenMode::WriteUpdate.to_string(), "w+");
        assert!("x".parse::<OpenMode>().is_err());
        assert!("b".parse::<OpenMode>().is_err());
    }
}
