//! I/O module for the keyring
//!
//! Contains the slot storage abstraction and its in-memory implementation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  Data channel (read/write path)     │
//! │  - resolves minor -> key            │
//! │  - copies at a clamped offset       │
//! └─────────────────────────────────────┘
//!          ▲
//!          │ uses SlotBuffer for storage
//!          ▼
//! ┌─────────────────────────────────────┐
//! │  SlotBuffer (shared storage)        │
//! │  - Arc<RwLock<Box<[u8]>>>           │
//! │  - read_at() under the read lock    │
//! │  - write_at() under the write lock  │
//! └─────────────────────────────────────┘
//!          ▲
//!          │ created/managed by
//!          ▼
//! ┌─────────────────────────────────────┐
//! │  SlotStore (directory)              │
//! │  - names buffers by key             │
//! │  - replaceable backend              │
//! └─────────────────────────────────────┘
//!          ▲
//!          │
//!       MemSlots
//! ```

pub mod buffer;
pub mod memslots;
pub mod types;

pub use buffer::{clamp, SlotBuffer, SlotReadGuard};
pub use memslots::MemSlots;
pub use types::{SlotKey, SlotStore};
