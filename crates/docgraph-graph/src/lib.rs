mod applier;

pub use applier::Neo4jGraphApplier;
