pub mod args;
pub mod simulate;
