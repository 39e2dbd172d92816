//! Memory-access traces.
//!
//! One request per line:
//!
//! ```text
//! <core> <kind> <address> [<byte>]
//! ```
//!
//! `kind` is `0` (read), `1` (write) or `2` (instruction fetch); `address`
//! and `byte` are hexadecimal, with or without a `0x` prefix. A write must
//! carry its byte. On a read the byte is optional and, when present, is the
//! value the read is expected to return. `#` starts a comment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::common::error::{SimResult, TraceError};
use crate::common::{AccessType, PhysAddr};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Request {
    pub core: usize,
    pub access: AccessType,
    pub addr: PhysAddr,
    /// Byte stored by a write; zero for reads.
    pub data: u8,
    /// Value the access should return.
    pub expected: Option<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Trace {
    requests: Vec<Request>,
}

impl Trace {
    pub fn new(requests: Vec<Request>) -> Self {
        Self { requests }
    }

    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let src = fs::read_to_string(path)?;
        Ok(src.parse::<Self>()?)
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl FromStr for Trace {
    type Err = TraceError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let mut requests = Vec::new();
        for (i, raw) in src.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            requests.push(parse_line(line).map_err(|reason| TraceError { line: i + 1, reason })?);
        }
        Ok(Self { requests })
    }
}

fn parse_line(line: &str) -> Result<Request, String> {
    let mut fields = line.split_whitespace();
    let mut next = |name: &str| fields.next().ok_or_else(|| format!("missing {name}"));

    let core = next("core")?;
    let core = core
        .parse::<usize>()
        .map_err(|_| format!("bad core id `{core}`"))?;
    let kind = next("access kind")?;
    let access = kind
        .parse::<u8>()
        .ok()
        .and_then(AccessType::from_code)
        .ok_or_else(|| format!("bad access kind `{kind}`"))?;
    let addr = next("address")?;
    let addr = u64::from_str_radix(strip_hex(addr), 16)
        .map_err(|_| format!("bad address `{addr}`"))?;
    let byte = match next("byte") {
        Ok(b) => Some(u8::from_str_radix(strip_hex(b), 16).map_err(|_| format!("bad byte `{b}`"))?),
        Err(_) => None,
    };
    if fields.next().is_some() {
        return Err("trailing fields".into());
    }

    let (data, expected) = match (access, byte) {
        (AccessType::Write, Some(b)) => (b, Some(b)),
        (AccessType::Write, None) => return Err("write without data byte".into()),
        (_, expected) => (0, expected),
    };

    Ok(Request {
        core,
        access,
        addr: PhysAddr(addr),
        data,
        expected,
    })
}

fn strip_hex(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}
