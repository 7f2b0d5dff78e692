pub mod decide;
pub mod diagnostics;
pub mod train;
