//! Mock implementations for integration tests.

mod services;
mod transports;

#[allow(unused_imports)]
pub use models::*;
#[allow(unused_imports)]
pub use services::*;
#[allow(unused_imports)]
pub use transports::*;
