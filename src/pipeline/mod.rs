// Extraction pipeline — batch inference and serialization.

pub mod features;
