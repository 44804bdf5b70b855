//! The byte codec (`spec.md` §4.1 / SPEC_FULL.md §4.1): primitive
//! readers/writers plus the three wire formats with non-trivial framing of
//! their own (floats, `NUMERIC`, one-dimensional arrays).

pub mod array;
pub mod buf_ext;
pub mod float;
pub mod numeric;
pub mod timestamp;

pub use buf_ext::{BufExt, BufMutExt, VecExt};
