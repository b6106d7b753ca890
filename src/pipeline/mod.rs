pub mod classify;
pub mod corpus;
pub mod diagnostic; // Per-document stage dump (REFERRAL_INTAKE_DUMP_DIR)
pub mod extraction;
pub mod processor; // Document analysis orchestrator
pub mod segmentation;
pub mod strategy;
