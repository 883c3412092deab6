mod backend;
mod process;
mod reader;
mod region;

// Scripted address space, available to unit and integration tests
#[doc(hidden)]
pub mod mock;

pub use process::{ProcessHandle, find_processes_by_name};
pub use reader::ReadMemory;
pub use region::{CommitState, Protection, Region};

#[doc(hidden)]
pub use mock::{MockMemory, MockMemoryBuilder};
