pub mod background;
pub mod cli;
pub mod content;
pub mod error;
pub mod field;
pub mod fill;
pub mod page;
pub mod persona;
pub mod report;
pub mod session;
pub mod suggest;
pub mod trace;
pub mod transport;
