pub mod health;
pub mod document;
pub mod diagnostics;

pub use health::*;
pub use document::*;
pub use diagnostics::*;
