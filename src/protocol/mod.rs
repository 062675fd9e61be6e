//! Command protocol.
//!
//! Requests are JSON objects with a `command` field:
//!
//! | Command | Fields | Success payload |
//! |---------|--------|-----------------|
//! | `submit_model` | `model` | `message` |
//! | `solve_model` | `timeout`? | `solution` |
//! | `get_solution` | | `solution` |
//! | `set_parameter` | `name`, `value` | `message` |
//! | `get_variable` | `name` | `value` |
//! | `get_solve_time` | | `solve_time` |
//!
//! Every response carries `status` (`SUCCESS` or `ERROR`); errors carry a
//! `message`. An infeasible or timed-out solve is still a `SUCCESS`.

mod command;
mod dispatcher;
mod server;
mod transport;

pub use command::{Command, Response, ResponseStatus};
pub use dispatcher::Dispatcher;
pub use server::serve;
pub use transport::{Frame, FrameReader, FrameWriter, MAX_HEADER_BYTES};
