//! Quasi-identifier analysis: correlation graphs, clustering, risk scoring

pub mod analyzer;
pub mod dbscan;
pub mod graph;

pub use analyzer::QuasiIdentifierAnalyzer;
pub use graph::CorrelationGraph;
