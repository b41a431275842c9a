pub mod assets;
pub mod predict;
