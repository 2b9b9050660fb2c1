mod batch;
mod run;

pub use run::{LATEST_RUN_MANIFEST, run};
