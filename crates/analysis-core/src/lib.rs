pub mod error;
pub mod frame;
pub mod series;
pub mod time;
pub mod traits;
pub mod types;

pub use error::*;
pub use frame::*;
pub use time::*;
pub use traits::*;
pub use types::*;
