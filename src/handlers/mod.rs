// handlers/mod.rs - two handler tiers
//
// Public (no session; n8n callbacks are optionally bearer-checked) → Protected (session JWT)
pub mod protected;
pub mod public;
