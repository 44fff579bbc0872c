//! Command handlers.
//!
//! | File      | Invocation                        | Description              |
//! |-----------|-----------------------------------|--------------------------|
//! | `run.rs`  | `course-backup --courseid=…` etc. | Back up selected courses |

pub mod run;
