#[path = "../common/mod.rs"]
mod common;

mod contexts;
mod records;
mod registry;
mod roundtrip;
mod scenario;
mod virtual_buffer;
