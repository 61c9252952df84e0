//! `use bevy_chunk_nav::prelude::*;` to import common structures and methods
//!

#[doc(hidden)]
pub use crate::nav::{
	chunk::*,
	entities::*,
	fields::{cost_field::*, flow_field::*, integration_field::*, los_field::*, *},
	geometry::*,
	queue::*,
	target::*,
	utilities::*,
	world::*,
};
#[doc(hidden)]
pub use crate::plugin::*;
#[doc(hidden)]
pub use crate::region::*;
