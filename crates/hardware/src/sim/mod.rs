pub mod runner;
pub mod trace;

pub use self::runner::{RunReport, run_hierarchy, run_parallel, run_sequential};
pub use self::trace::{Request, Trace};
