pub mod boolean;
pub mod cluster;
pub mod offset;
pub mod reconstruct;
