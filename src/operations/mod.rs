pub mod creation;
pub mod shaping;
