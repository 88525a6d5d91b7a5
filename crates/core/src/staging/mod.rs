//! Locating and reading the data files produced by job scripts
//!
//! ## Example
//!
//! ```rust,ignore
//! use dataloom_core::staging::{DataFileLocator, DataFileReader, LocatorConfig};
//!
//! let locator = DataFileLocator::new(LocatorConfig::default());
//! let file = locator.locate(Some(output_slot))?;
//! let dataset = DataFileReader::default().read(&file.path)?;
//! println!("{} rows", dataset.row_count());
//! ```

mod dataset;
mod error;
mod locate;
mod reader;

pub use dataset::{Dataset, normalize_headers};
pub use error::{IngestError, IngestResult};
pub use locate::{DataFileLocator, LocateSource, LocatedFile, LocatorConfig};
pub use reader::{DataFileReader, FileFormat, ReaderConfig};
