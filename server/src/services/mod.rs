pub mod generate;
pub mod room;
