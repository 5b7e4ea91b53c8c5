//! Byte-stream helpers shared by the tokenizer front ends, plus the entity
//! table generator.

pub mod entity_table;
pub mod utf8;
