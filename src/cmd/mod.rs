/*!
Command layer: the registry, argument bag, dispatcher and result
envelope shared by the interactive shell and the headless runner.
*/

pub mod argbag;
pub mod dispatch;
pub mod envelope;
pub mod format;
pub mod registry;
pub mod toon;

pub use argbag::ArgBag;
pub use dispatch::Dispatcher;
pub use envelope::{OutputFormat, ResultEnvelope};
