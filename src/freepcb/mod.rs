// FreePCB library -> KiCad `.pretty` conversion.

pub mod convert;
pub mod exceptions;
pub mod kicad;
pub mod library;
pub mod reader;
pub mod sexp;
pub mod threedmap;

pub use convert::{convert_archive, read_archive, read_files, write_library};
pub use library::{Footprint, Library};
