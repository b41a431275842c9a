pub mod scaler;
pub mod split;

pub use scaler::{Scaler, ScalerKind};
pub use split::{train_test_split, Split};
