//! Domain types for coilwatch

pub mod alert;
pub mod analysis;
pub mod bar;
pub mod ids;

pub use alert::{AlertRecord, AlertType, Severity};
pub use analysis::{AnalysisRecord, BreakoutProbability};
pub use bar::{Bar, BarError, DerivedBar, RawBar};
pub use ids::{AlertKey, AnalysisKey, ConfigHash, DatasetHash};
