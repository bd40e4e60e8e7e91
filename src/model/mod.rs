pub mod linear;
pub mod task;
pub mod workspace;
