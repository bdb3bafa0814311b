pub mod ext;
pub mod name;

mod certificate;
mod field;

pub use certificate::Certificate;
pub use field::Field;
