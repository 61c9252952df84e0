//! The CostField contains a 2D array of 8-bit values describing how difficult
//! each tile of a chunk is to traverse. A value of 1 is the default, values up
//! to 254 indicate increasingly expensive terrain such as slopes or marshes
//! and the special value [COST_IMPASSABLE] marks a tile that can never be
//! pathed through (a cliff or a wall)
//!

use crate::prelude::*;

/// Static terrain cost of every tile in a chunk
#[derive(Clone)]
pub struct CostField([[u8; FIELD_RES_C]; FIELD_RES_R]);

impl Default for CostField {
	fn default() -> Self {
		CostField([[1; FIELD_RES_C]; FIELD_RES_R])
	}
}

impl Field<u8> for CostField {
	/// Get a reference to the field array
	fn get(&self) -> &[[u8; FIELD_RES_C]; FIELD_RES_R] {
		&self.0
	}
	/// Retrieve a field cell value
	///
	/// NB: This will panic if out of bounds
	fn get_field_cell_value(&self, field_cell: FieldCell) -> u8 {
		self.0[field_cell.get_row()][field_cell.get_column()]
	}
	/// Set a field cell to a value
	///
	/// NB: This will panic if out of bounds
	fn set_field_cell_value(&mut self, value: u8, field_cell: FieldCell) {
		self.0[field_cell.get_row()][field_cell.get_column()] = value;
	}
}

impl CostField {
	/// Create a new [CostField] with all cell values initialised with `cost`
	pub fn new_with_cost(cost: u8) -> Self {
		CostField([[cost; FIELD_RES_C]; FIELD_RES_R])
	}
}
