pub mod bow;
pub mod corpus_stage;
pub mod pool;
pub mod report;
