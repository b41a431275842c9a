pub mod loss_curve;

pub use loss_curve::{render_loss_curve, save_loss_curve};
