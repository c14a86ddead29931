pub mod dirty_buffer;
pub mod entity;
pub mod entity_allocator;
pub mod entity_manager;
pub mod error;
pub mod eye;
pub mod metadata;
pub mod storage;
pub mod transform;
pub mod visibility;
