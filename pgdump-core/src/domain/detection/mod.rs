pub mod arguments;
pub mod binary;
pub mod files;
pub mod heuristics;
pub mod network;
pub mod scoring;
pub mod syscall;

pub use arguments::{ArgumentScanner, CommandLineAnalysis};
pub use binary::BinaryMatcher;
pub use files::FileAnalysis;
pub use heuristics::{HeuristicAnalysis, HeuristicInput};
pub use network::{NetworkAnalysis, PostgresEndpoints};
pub use scoring::{Assessment, Evidence, SuspicionScorer, Verdict};
pub use syscall::SystemCallProfile;
