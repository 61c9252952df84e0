//! The kinds of fields layered over a chunk's tile grid
//!

pub mod cost_field;
pub mod flow_field;
pub mod integration_field;
pub mod los_field;

use crate::prelude::*;

/// Defines required access to the fixed-size field arrays
pub trait Field<T> {
	/// Get a reference to the field array
	fn get(&self) -> &[[T; FIELD_RES_C]; FIELD_RES_R];
	/// Retrieve a field cell value
	fn get_field_cell_value(&self, field_cell: FieldCell) -> T;
	/// Set a field cell to a value
	fn set_field_cell_value(&mut self, value: T, field_cell: FieldCell);
}
