mod aggregation;
mod budget;
mod category;
mod money;
mod month;
mod report;
mod transaction;
mod window;

pub use aggregation::*;
pub use budget::*;
pub use category::*;
pub use money::*;
pub use month::*;
pub use report::*;
pub use transaction::*;
pub use window::*;
