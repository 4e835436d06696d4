//! Protocol handling — session state machine and JSON-RPC dispatch.

pub mod handler;
pub mod method;
pub mod policy;
pub mod session;
pub mod validator;

pub use handler::{Control, Dispatch, Dispatcher};
pub use method::Method;
pub use policy::{AutoInitialize, ReinitializePolicy, SessionPolicy};
pub use session::{SessionState, SharedSession};
