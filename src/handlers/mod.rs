// handlers/mod.rs - three security tiers
//
// Public (no session) → Protected (session + tenant scope) → Elevated (admin role)
pub mod elevated;
pub mod protected;
pub mod public;
