//! Stack Frames and Backtraces.
//!
//! `CALL` and interrupt entry create a frame: the return `IP` and the caller's `FP`
//! are pushed, `FP` becomes `SP`, and the frame is recorded. `RET` and interrupt
//! exit destroy it. With frame checking on, a frame can only be destroyed while
//! `SP` is back where the frame left it; anything else means the stack is corrupted.

use serde::Serialize;

use super::CpuCore;
use crate::common::error::Fault;

/// A live stack frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StackFrame {
    /// Code segment of the caller.
    pub cs: u32,
    /// Data segment holding the frame.
    pub ds: u32,
    /// Frame pointer established by the frame (equal to `sp`).
    pub fp: u32,
    /// Return address in the caller.
    pub ip: u32,
    /// Stack pointer right after the frame was created.
    pub sp: u32,
}

/// One line of a backtrace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BacktraceEntry {
    /// Code segment.
    pub cs: u32,
    /// CS-relative instruction address.
    pub ip: u32,
    /// Nearest symbol at or below `ip`, if known.
    pub symbol: Option<String>,
    /// Offset of `ip` from the symbol.
    pub offset: u32,
}

impl std::fmt::Display for BacktraceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.symbol {
            Some(name) => write!(f, "{:#06x}:{:#010x} <{name}+{:#x}>", self.cs, self.ip, self.offset),
            None => write!(f, "{:#06x}:{:#010x}", self.cs, self.ip),
        }
    }
}

impl CpuCore {
    /// Pushes `IP` and `FP`, sets `FP = SP`, and records the frame.
    pub fn create_frame(&mut self) -> Result<(), Fault> {
        let ip = self.regs.ip;
        self.push(ip)?;
        let fp = self.regs.fp;
        self.push(fp)?;
        self.regs.fp = self.regs.sp;
        self.frames.push(StackFrame {
            cs: self.regs.cs,
            ds: self.regs.ds,
            fp: self.regs.fp,
            ip,
            sp: self.regs.sp,
        });
        Ok(())
    }

    /// Verifies `SP`, pops `FP` and `IP`, and drops the recorded frame.
    ///
    /// # Errors
    ///
    /// With frame checking on, `Fault::InvalidFrame` when no frame is recorded or
    /// `SP` differs from the value the frame was created with.
    pub fn destroy_frame(&mut self) -> Result<(), Fault> {
        let found = self.regs.sp;
        match self.frames.last() {
            Some(frame) if self.check_frames && frame.sp != found => {
                return Err(Fault::InvalidFrame {
                    expected: frame.sp,
                    found,
                });
            }
            None if self.check_frames => {
                return Err(Fault::InvalidFrame { expected: 0, found });
            }
            _ => {}
        }
        self.regs.fp = self.pop()?;
        self.regs.ip = self.pop()?;
        let _ = self.frames.pop();
        Ok(())
    }

    /// Returns one entry per live frame, outermost first, followed by the current
    /// instruction.
    pub fn backtrace(&self) -> Vec<BacktraceEntry> {
        self.frames
            .iter()
            .map(|frame| (frame.cs, frame.ip))
            .chain(std::iter::once((self.regs.cs, self.regs.ip)))
            .map(|(cs, ip)| {
                let (symbol, offset) = match self.symbols.resolve(cs, ip) {
                    Some((name, offset)) => (Some(name), offset),
                    None => (None, 0),
                };
                BacktraceEntry {
                    cs,
                    ip,
                    symbol,
                    offset,
                }
            })
            .collect()
    }
}
