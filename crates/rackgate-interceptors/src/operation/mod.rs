pub mod model;
pub mod table;

pub use model::{ApiDocument, OperationDescriptor, ParamDescriptor, ScopeHandler};
pub use table::{OperationTable, RouteMatch};
