//! Layout data model
//!
//! Boards, assembly components and their instances, connections,
//! arrangements and the persistent design snapshot.

pub mod arrangement;
pub mod board;
pub mod component;
pub mod connection;
pub mod design;

pub use arrangement::*;
pub use board::*;
pub use component::*;
pub use connection::*;
pub use design::*;
