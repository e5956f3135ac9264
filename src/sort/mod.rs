pub mod heap;
pub mod merge;
pub mod quicksort;
pub mod run_generation;
pub mod sorter;

pub use self::merge::MergeEngine;
pub use self::run_generation::generate_runs;
pub use self::sorter::ExternalSorter;
