//! Testing utilities and harness for the Trellis DOM core

pub mod harness;
pub mod testing;

pub use harness::{TestDocument, TestDocumentFactory};
pub use testing::*;

pub mod prelude {
    pub use crate::harness::{TestDocument, TestDocumentFactory};
    pub use crate::testing::*;
}
