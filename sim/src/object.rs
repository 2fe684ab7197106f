//! The `.yo` object file format.
//!
//! Each line of an object file is a record of fixed width:
//!
//! ```text
//! 0x014: 30f30a00000000000000 |     irmovq $10, %rbx
//! ^      ^                   ^^
//! 0      7                  27 28
//! ```
//!
//! A data record has the address `0x` followed by 3 hex digits, a colon and a
//! space, then up to 10 bytes of data in hex. A comment record is blank up to
//! the `|` delimiter. Everything after the delimiter is ignored.

use std::fmt::Display;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{LoadError, MemoryError};
use crate::framework::{Memory, MEM_SIZE};

/// Column of the `|` delimiter.
const DELIM_COL: usize = 28;
/// Width of the data field, including its padding.
const DATA_WIDTH: usize = 20;

static DATA_RECORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^0x([[:xdigit:]]{3}): ([ [:xdigit:]]{20}) \|(.*)$").expect("data record pattern")
});

static COMMENT_RECORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {28}\|(.*)$").expect("comment record pattern"));

/// One line of an object file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Record {
    /// `None` for a comment record.
    pub addr: Option<u64>,
    pub data: Vec<u8>,
    /// Text after the delimiter.
    pub comment: String,
}

impl Record {
    fn parse(lineno: usize, line: &str) -> Result<Self, LoadError> {
        let malformed = || LoadError::Malformed {
            line: lineno,
            text: line.to_string(),
        };

        if let Some(caps) = COMMENT_RECORD.captures(line) {
            return Ok(Self {
                addr: None,
                data: Vec::new(),
                comment: caps[1].to_string(),
            });
        }

        let caps = DATA_RECORD.captures(line).ok_or_else(malformed)?;
        let addr = u64::from_str_radix(&caps[1], 16).map_err(|_| malformed())?;
        // hex digits first, padding after
        let hex = caps[2].trim_end_matches(' ');
        if hex.contains(' ') || hex.len() % 2 != 0 {
            return Err(malformed());
        }
        let data = (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| malformed())?;

        Ok(Self {
            addr: Some(addr),
            data,
            comment: caps[3].to_string(),
        })
    }

    fn end(&self) -> Option<u64> {
        self.addr.map(|a| a + self.data.len() as u64)
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.addr {
            Some(addr) => {
                write!(f, "{:#05x}: ", addr)?;
                let hex: String = self.data.iter().map(|b| format!("{:02x}", b)).collect();
                write!(f, "{: <1$} ", hex, DATA_WIDTH)?;
            }
            None => write!(f, "{: <1$}", "", DELIM_COL)?,
        }
        write!(f, "|{}", self.comment)
    }
}

/// A parsed object file. Only files that passed every check are represented,
/// so committing one to memory cannot fail halfway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ObjectFile {
    pub records: Vec<Record>,
}

impl ObjectFile {
    /// Commit the data of every record to `mem`, in file order.
    pub fn write_to(&self, mem: &mut Memory) -> Result<(), MemoryError> {
        for rec in &self.records {
            let Some(addr) = rec.addr else { continue };
            for (i, byte) in rec.data.iter().enumerate() {
                mem.put_byte(addr + i as u64, *byte)?;
            }
        }
        Ok(())
    }

    /// A fresh memory holding the program.
    pub fn init_mem(&self) -> Result<Memory, MemoryError> {
        let mut mem = Memory::default();
        self.write_to(&mut mem)?;
        Ok(mem)
    }

    /// The same records, with their data re-read from `mem`.
    pub fn snapshot(&self, mem: &Memory) -> Result<ObjectFile, MemoryError> {
        let records = self
            .records
            .iter()
            .map(|rec| {
                let data = match rec.addr {
                    Some(addr) => mem.read_range(addr, rec.data.len())?.to_vec(),
                    None => Vec::new(),
                };
                Ok(Record { data, ..rec.clone() })
            })
            .collect::<Result<_, MemoryError>>()?;
        Ok(ObjectFile { records })
    }

    /// Number of bytes the program occupies.
    pub fn len(&self) -> usize {
        self.records.iter().map(|r| r.data.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Display for ObjectFile {
    /// display yo format
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rec in &self.records {
            writeln!(f, "{rec}")?;
        }
        Ok(())
    }
}

/// Parse the text of an object file. Line numbers in errors start from 1.
pub fn parse(src: &str) -> Result<ObjectFile, LoadError> {
    let mut records = Vec::new();
    // end of the last record that carried data
    let mut last = 0;
    for (i, line) in src.lines().enumerate() {
        let lineno = i + 1;
        let rec = Record::parse(lineno, line)?;
        if let (Some(addr), Some(end)) = (rec.addr, rec.end()) {
            if addr < last {
                return Err(LoadError::AddressOrder {
                    line: lineno,
                    addr,
                    last,
                });
            }
            if end > MEM_SIZE as u64 {
                return Err(LoadError::Overflow { line: lineno });
            }
            if !rec.data.is_empty() {
                last = end;
            }
        }
        records.push(rec);
    }
    tracing::debug!("parsed {} records", records.len());
    Ok(ObjectFile { records })
}

/// Read and parse the object file at `path`, which must have the `.yo`
/// extension.
pub fn load(path: impl AsRef<Path>) -> Result<ObjectFile, LoadError> {
    let path = path.as_ref();
    if path.extension().map_or(true, |ext| ext != "yo") {
        return Err(LoadError::Extension(path.to_path_buf()));
    }
    let src =
        std::fs::read_to_string(path).map_err(|e| LoadError::Io(path.to_path_buf(), e))?;
    let obj = parse(&src)?;
    tracing::info!("loaded {} bytes from {}", obj.len(), path.display());
    Ok(obj)
}
