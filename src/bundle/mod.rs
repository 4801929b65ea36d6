//! Bundle declaration and input resolution.
//!
//! ```text
//! BundleSpec ─► PatternList::scan ─► OrderResolver::resolve ─► ordered inputs
//! ```
//!
//! | Module      | Purpose                                            |
//! |-------------|----------------------------------------------------|
//! | `pattern`   | Include/exclude pattern lists and filesystem scan  |
//! | `order`     | First-match-wins concatenation ordering            |
//! | `candidate` | A file found by a scan                             |
//! | `spec`      | One declared output artifact                       |

mod candidate;
mod pattern;
mod order;
mod spec;

pub use candidate::CandidateFile;
pub use pattern::{GlobError, NegationMode, PatternList, WatchDir};
pub use order::OrderResolver;
pub use spec::{BundleSpec, is_plain_file_name};
