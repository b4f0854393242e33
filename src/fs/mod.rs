//! A deliberately small filesystem module: `read_file`/`write_file`/
//! `list_directory`, so a freshly started server isn't limited to the
//! database and web tool families. Out of scope per the kernel's own
//! specification — this exists only so the binary is runnable end to end.

pub mod module;

pub use module::FsModule;
