pub mod session;
pub mod tick;
