pub mod city;
pub mod stats;
pub mod time;
pub mod viewport;

pub use city::*;
pub use stats::*;
pub use time::*;
pub use viewport::*;
