//! Typed error taxonomy for the core simulator.
//!
//! The C original threads a process-wide `error_code` enum through every
//! return value. We keep that shape as [`ErrorCode`] for the driver/CLI to
//! print, but within the core itself failures are carried by [`SimError`]
//! (via `thiserror`) so each variant can hold the context needed to explain
//! itself instead of just a bare code.

use std::fmt;

use thiserror::Error;

use crate::addr::VirtAddr;

/// The six process-wide codes, in the order the original taxonomy lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    None,
    BadParam,
    Addr,
    Mem,
    Io,
    Size,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::None => "ERR_NONE",
            ErrorCode::BadParam => "ERR_BAD_PARAMETER",
            ErrorCode::Addr => "ERR_ADDR",
            ErrorCode::Mem => "ERR_MEM",
            ErrorCode::Io => "ERR_IO",
            ErrorCode::Size => "ERR_SIZE",
        };
        f.write_str(name)
    }
}

/// A core-level failure. Every fallible operation in the page-walker, TLBs,
/// and caches returns `Result<_, SimError>`; nothing in the core panics or
/// unwinds on a bad-but-reachable input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("bad parameter: {0}")]
    BadParam(String),

    #[error("address error at {vaddr}: {reason}")]
    Addr { vaddr: VirtAddr, reason: String },

    #[error("memory error: {0}")]
    Mem(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("size error: {0}")]
    Size(String),
}

impl SimError {
    pub fn bad_param(reason: impl Into<String>) -> Self {
        SimError::BadParam(reason.into())
    }

    pub fn addr(vaddr: VirtAddr, reason: impl Into<String>) -> Self {
        SimError::Addr {
            vaddr,
            reason: reason.into(),
        }
    }

    pub fn mem(reason: impl Into<String>) -> Self {
        SimError::Mem(reason.into())
    }

    pub fn size(reason: impl Into<String>) -> Self {
        SimError::Size(reason.into())
    }

    /// The process-wide code this failure corresponds to.
    pub fn code(&self) -> ErrorCode {
        match self {
            SimError::BadParam(_) => ErrorCode::BadParam,
            SimError::Addr { .. } => ErrorCode::Addr,
            SimError::Mem(_) => ErrorCode::Mem,
            SimError::Io(_) => ErrorCode::Io,
            SimError::Size(_) => ErrorCode::Size,
        }
    }
}

impl From<std::io::Error> for SimError {
    fn from(e: std::io::Error) -> Self {
        SimError::Io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SimError>;

/// Hit/miss outcome of a TLB or cache probe; this channel never carries an
/// error -- a malformed lookup degrades to `Miss` rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOrMiss {
    Hit,
    Miss,
}

impl HitOrMiss {
    pub fn is_hit(self) -> bool {
        matches!(self, HitOrMiss::Hit)
    }
}
