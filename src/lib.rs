#[macro_use]
extern crate log;

pub mod addr;
pub mod cache;
pub mod cli;
pub mod command;
pub mod constants;
pub mod dump;
pub mod error;
pub mod loader;
pub mod lru_list;
pub mod memory;
pub mod page_walk;
pub mod parser;
pub mod simulator;
pub mod tlb;

pub use crate::addr::{PhysAddr, VirtAddr};
pub use crate::error::{ErrorCode, HitOrMiss, Result, SimError};
pub use crate::simulator::Simulator;
