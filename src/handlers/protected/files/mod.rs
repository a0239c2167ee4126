pub mod dispatch;

pub use dispatch::file_dispatch;
