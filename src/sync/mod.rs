//! Hand-off primitives between the RTSP client, decoder and reader threads.
pub mod error_slot;
pub mod queue;
pub mod swapper;

pub use error_slot::ErrorSlot;
pub use queue::Queue;
pub use swapper::Swapper;
