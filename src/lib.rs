pub mod cmds;
pub mod conductors;
mod constructors;
pub mod controllers;
pub mod entities;
pub mod interactors;
pub mod presenters;
pub mod repositories;
pub mod storage;
pub mod usecases;
pub(crate) mod utils;

pub use constructors::*;
