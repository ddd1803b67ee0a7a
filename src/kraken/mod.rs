pub mod subscription;
pub mod types;
pub mod ws;
