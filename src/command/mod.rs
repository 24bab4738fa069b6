pub mod split;
pub mod resolve;
pub mod launch;

pub use split::{ArgumentList, split_arguments};
pub use resolve::{EmptySegmentPolicy, Resolution, resolve};
pub use launch::{CommandOutcome, Launcher, SystemLauncher, execute};
