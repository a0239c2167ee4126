// handlers/public/mod.rs - Public handlers (no session required)
//
// Route Prefix: /, /health, /api/webhooks/n8n/callback
// Middleware: n8n callback token check on the callback route only

pub mod n8n;
pub mod system;

pub use n8n::n8n_callback;
pub use system::{health, root};
