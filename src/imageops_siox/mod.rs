pub mod blob;
pub mod classify;
pub mod cluster;
pub mod color;
pub mod confidence;
pub mod refine;
pub mod segmentate;
pub mod signature;
