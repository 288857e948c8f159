//! Media lifecycle: writing provenance-tagged mock media into the library and
//! the two deletion strategies that reconcile the tracked set with reality.

pub mod error;
pub mod eraser;
pub mod writer;

pub use eraser::MediaEraser;
pub use writer::{MediaWriter, PhotoOptions};
