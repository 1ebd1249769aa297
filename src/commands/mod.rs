mod install;
mod report;
mod update;

pub use install::install;
pub use report::report;
pub use update::update;
