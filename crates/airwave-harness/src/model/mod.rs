//! Reference model for model-based testing.
//!
//! [`ModelWorld`] is a deliberately naive restatement of the session rules:
//! plain vectors and sets, no registry, no reverse index, no wire format.
//! Model-based tests apply the same [`Operation`]s to the model and to a
//! [`SimServer`](crate::SimServer) and require identical results and
//! identical [`ObservableState`].

mod operation;
mod world;

pub use operation::{ClientId, Operation, SessionRef};
pub use world::{
    ModelSession, ModelWorld, ObservableSession, ObservableState, OperationError, OperationResult,
};
