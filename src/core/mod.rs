pub mod coherence;
pub mod config;
pub mod context;
pub mod difficulty;
pub mod effects;
pub mod markov;
pub mod pipeline;
pub mod vocabulary;
pub mod writer;
