pub mod bus;
pub mod scratchpad;
pub mod slaves;
