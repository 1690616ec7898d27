pub mod banks;
pub mod keys;
pub mod run;
pub mod source;
pub mod store;
pub mod throttle;

pub use keys::{SkipList, parse_key_list, read_key_list};
pub use run::{Pipeline, RunOptions, RunSummary, page_url, write_tag_reports};
pub use source::{DirectorySource, FetchError, PageSource, fetch_with_retries};
pub use store::{Store, read_records};
pub use throttle::Throttle;
