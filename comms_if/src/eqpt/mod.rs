//! # Equipment Interface
//!
//! This module defines the structures passed between the control core and the equipment around
//! it. Producers only ever publish their latest value, the core never waits on them.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod mcu;
pub mod vision;
