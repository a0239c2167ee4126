pub mod file_record;
pub mod secret;

pub use file_record::{FileRecord, FileSnapshot, ProcessingResult};
pub use secret::Secret;
