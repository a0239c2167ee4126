pub mod callback;

pub use callback::n8n_callback;
