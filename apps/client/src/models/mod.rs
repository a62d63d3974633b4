pub mod resume;
pub mod status;
