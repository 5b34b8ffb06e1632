pub mod applications;
pub mod ids;
