pub mod penepma;
pub mod penshower;

mod sections;
mod traits;

pub use sections::{ExportReport, ExporterWarning, InputFileBuilder};
pub use traits::{ImportFailure, ImportedResults, ProgramExporter, ProgramImporter};
