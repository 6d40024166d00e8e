//! Global allocator for the `zesec` binary.
//!
//! The library leaves allocation to its host; only the command-line front-end
//! opts into mimalloc.

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
