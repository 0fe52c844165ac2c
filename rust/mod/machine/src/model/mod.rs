mod document;
mod machine;
mod qc_form;
mod slot;

pub use document::*;
pub use machine::*;
pub use qc_form::*;
pub use slot::*;
