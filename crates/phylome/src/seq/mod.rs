//! Sequence and alignment primitives.

mod alignment;
mod member;

pub use alignment::{Alignment, Row, GAP};
pub use member::{reverse_complement, Member, Strand};
