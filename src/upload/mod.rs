pub mod chunker;
pub mod coordinator;
pub mod file;
pub mod retry;
pub mod session;

pub use self::{
    chunker::{Chunker, Part},
    coordinator::{Coordinator, Upload},
    file::FileHandle,
    retry::Retry,
    session::{Outcome, Session, State},
};
