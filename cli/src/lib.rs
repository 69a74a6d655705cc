//! Shell front ends for the keyring registry and the stack/queue calls
//!
//! Each command mirrors a small user-space program: it takes `argv`
//! (program name first), prints its messages and returns the process exit
//! code. All of them run against one [`Kernel`].

pub mod commands;

pub use commands::{atoi, run, Kernel};
