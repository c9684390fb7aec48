//! Image I/O and output format services

pub mod format;
pub mod io;

pub use format::OutputFormatHandler;
pub use io::ImageIoService;
