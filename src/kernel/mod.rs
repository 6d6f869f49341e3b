//! Weighted-Degree string kernel feature map

pub mod layout;
pub mod scorer;
pub mod weights;

pub use self::layout::*;
pub use self::scorer::*;
pub use self::weights::*;
