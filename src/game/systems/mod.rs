pub mod ai;
pub mod conversion;
pub mod cursor;
pub mod physics;
