//! The interactive listen → translate → speak loop.

pub mod commands;
pub mod controller;

pub use commands::{CommandSource, ControlCommand, ScriptedCommands, StdinCommands};
pub use controller::{
    Controller, ControllerConfig, ControllerEvent, ControllerEvents, ControllerState,
    EventCollector,
};
