//! visamatch-pipeline: configuration, the on-disk layout, and the classify
//! and match passes that move files between role directories.

pub mod classify;
pub mod config;
pub mod embed;
pub mod error;
pub mod layout;
pub mod matching;
pub mod operator;
pub mod report;

pub use classify::classify_directory;
pub use config::{Config, ConfigError};
pub use embed::{load_records, LoadedSet, Unprocessable};
pub use error::{PipelineError, Result};
pub use layout::{relocate, scan_jpgs, unique_destination, Layout, Relocation, Side};
pub use matching::{file_pairing, match_directories, MatchOptions};
pub use operator::{Operation, Operator, OperatorState, RunGuard};
pub use report::{ClassifyEntry, ClassifyReport, FiledEntry, MatchReport, MatchedEntry, Outcome};
