//! Configuration section definitions.
//!
//! Each module corresponds to a section in `stitch.toml`:
//!
//! | Module     | TOML Section                              | Purpose                        |
//! |------------|-------------------------------------------|--------------------------------|
//! | `bundle`   | `[[bundles.styles]]`, `[[bundles.scripts]]` | Declared output artifacts    |
//! | `markup`   | `[markup]`                                | HTML pages and includes        |
//! | `pipeline` | `[pipeline]`                              | Transform stage settings       |
//! | `profile`  | `[profile]`, `[profiles.<name>]`          | Environment profiles           |
//! | `serve`    | `[serve]`                                 | Development server             |
//! | `pattern`  | `[glob]`                                  | Negation semantics             |

mod bundle;
mod markup;
mod pattern;
mod pipeline;
mod profile;
mod serve;

pub use bundle::{BundleConfig, BundlesConfig};
pub use markup::MarkupConfig;
pub use pattern::GlobConfig;
pub use pipeline::{PipelineConfig, StyleCompiler};
pub use profile::{ActiveProfile, ProfileConfig, ProfileSelect, select_profile};
pub use serve::ServeConfig;
