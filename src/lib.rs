//! Inertial jog wheel
//!
//! Hardware jog controllers send relative movement as three-byte control
//! messages. This crate normalizes those messages from every attached device,
//! turns them into angular impulses, integrates them with geometric decay and
//! drives the result from a display-refresh scheduler that goes idle as soon
//! as the wheel comes to rest.
//!
//! ```text
//! input ──ControlEvent──► wheel (mapping + physics) ◄──tick── scheduler
//!                              │
//!                              └── angle ──► ui
//! ```

pub mod control;
pub mod input;
pub mod mapping;
pub mod physics;
pub mod scheduler;
pub mod settings;
pub mod ui;
pub mod wheel;
