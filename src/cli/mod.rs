//! Command Line Interface module
//!
//! One submodule per subcommand plus `output`, the display and save flags
//! shared by `get`, `search` and `load`.

pub mod cache;
pub mod dumps;
pub mod get;
pub mod load;
pub mod output;
pub mod publish;
pub mod search;
