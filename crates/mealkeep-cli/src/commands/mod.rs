pub mod like;
pub mod list;
pub mod migrate;
pub mod remove;
pub mod show;
pub mod sync;
