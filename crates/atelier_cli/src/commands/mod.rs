pub(crate) mod history;
pub(crate) mod meta;
pub(crate) mod migrate;
pub(crate) mod run;
pub(crate) mod schedule;
pub(crate) mod shared;
