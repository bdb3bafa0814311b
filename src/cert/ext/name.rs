mod general;

pub use general::{GeneralName, GeneralNames};
