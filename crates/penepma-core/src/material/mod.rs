pub mod forcing;
pub mod info;
pub mod writer;

pub use forcing::correct_forcer;
pub use info::{
    MaterialInfo, MaterialInfoError, MaterialProperties, MaterialPropertySource,
    TabulatedPropertySource,
};
pub use writer::{MaterialFileWriter, PendbaseMaterialTool, material_tool_answers};
