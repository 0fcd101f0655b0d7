pub mod error;
pub mod fetcher;
pub mod matcher;
pub mod registry;
pub mod result;
pub mod scanner;
pub mod signatures;
pub mod target;

pub use error::ScanError;
pub use fetcher::{FetchedPage, Fetcher, FetcherConfig};
pub use matcher::{Pattern, SignatureMatcher};
pub use registry::DedupRegistry;
pub use result::Finding;
pub use scanner::{FindingCallback, ProgressCallback, Scanner};
pub use signatures::SignatureSet;
pub use target::{Host, TargetExpander};
