//! Service layer composing the memory pipeline.

pub mod memory;
