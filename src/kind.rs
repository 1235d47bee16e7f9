#[allow(unused_imports)]
use crate::*;



/// Bit set of failure categories. A failed check usually raises one kind, but
/// kinds combine with `|` when a single condition covers several problems.

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ErrorKind
{
	bits : u32,
}

impl ErrorKind
{
	pub const UNDEFINED_VARIABLE 	: Self = Self { bits : 1 << 0 };
	pub const NUMBER_IS_NAN 		: Self = Self { bits : 1 << 1 };
	pub const NUMBER_IS_INF 		: Self = Self { bits : 1 << 2 };
	pub const ALIASED_POINTERS 		: Self = Self { bits : 1 << 3 };
	pub const EOF_FOUND 			: Self = Self { bits : 1 << 4 };
	pub const POINTER_IS_NULL 		: Self = Self { bits : 1 << 5 };
	pub const CANNOT_OPEN_FILE 		: Self = Self { bits : 1 << 6 };
	pub const WRONG_DATA_FORMAT 	: Self = Self { bits : 1 << 7 };
	pub const INVALID_ARGUMENTS 	: Self = Self { bits : 1 << 8 };
	pub const FILE_CLOSE_ERROR 		: Self = Self { bits : 1 << 9 };
	pub const LENGTH_TOO_BIG 		: Self = Self { bits : 1 << 10 };
	pub const INVALID_VALUE 		: Self = Self { bits : 1 << 11 };
	pub const STACK_OVERFLOW 		: Self = Self { bits : 1 << 12 };
	pub const ALLOCATION_ERROR 		: Self = Self { bits : 1 << 13 };

	pub const fn bits(self) -> u32
	{
		self.bits
	}

	pub const fn is_empty(self) -> bool
	{
		self.bits == 0
	}

	pub const fn intersects(self, other : Self) -> bool
	{
		(self.bits & other.bits) != 0
	}
}

impl std::ops::BitOr for ErrorKind
{
	type Output = Self;

	fn bitor(self, other : Self) -> Self
	{
		Self { bits : self.bits | other.bits }
	}
}

impl std::ops::BitOrAssign for ErrorKind
{
	fn bitor_assign(&mut self, other : Self)
	{
		self.bits |= other.bits;
	}
}

impl std::fmt::Debug for ErrorKind
{
	fn fmt(&self, formatter : &mut std::fmt::Formatter) -> std::fmt::Result
	{
		if self.is_empty()
		{
			return write!(formatter, "(none)");
		}

		let mut first = true;

		for info in KIND_TABLE.iter()
		{
			if self.intersects(info.kind)
			{
				match first
				{
					true 	=> write!(formatter, "{}", info.label)?,
					false 	=> write!(formatter, "+{}", info.label)?,
				}

				first = false;
			}
		}

		Ok(())
	}
}



pub(crate) struct KindInfo
{
	pub kind 	: ErrorKind,
	pub label 	: &'static str,
	pub message : &'static str,
}

// One entry per kind, in bit order. Reports walk this table so a combined
//  kind always prints its messages in a stable order.

pub(crate) const KIND_TABLE : [KindInfo; 14] =
[
	KindInfo { kind : ErrorKind::UNDEFINED_VARIABLE, 	label : "undefined_variable", 	message : "Variable is undefined" },
	KindInfo { kind : ErrorKind::NUMBER_IS_NAN, 		label : "number_is_nan", 		message : "Requested number is NaN" },
	KindInfo { kind : ErrorKind::NUMBER_IS_INF, 		label : "number_is_inf", 		message : "Requested number is inf" },
	KindInfo { kind : ErrorKind::ALIASED_POINTERS, 		label : "aliased_pointers", 	message : "One or multiple pointers are similar" },
	KindInfo { kind : ErrorKind::EOF_FOUND, 			label : "eof_found", 			message : "EOF symbol has been found in input buffer" },
	KindInfo { kind : ErrorKind::POINTER_IS_NULL, 		label : "pointer_is_null", 		message : "Requested pointer is NULL" },
	KindInfo { kind : ErrorKind::CANNOT_OPEN_FILE, 		label : "cannot_open_file", 	message : "Can not open file" },
	KindInfo { kind : ErrorKind::WRONG_DATA_FORMAT, 	label : "wrong_data_format", 	message : "Incorrect data format" },
	KindInfo { kind : ErrorKind::INVALID_ARGUMENTS, 	label : "invalid_arguments", 	message : "Invalid command line arguments" },
	KindInfo { kind : ErrorKind::FILE_CLOSE_ERROR, 		label : "file_close_error", 	message : "Can not close file" },
	KindInfo { kind : ErrorKind::LENGTH_TOO_BIG, 		label : "length_too_big", 		message : "String length is too big" },
	KindInfo { kind : ErrorKind::INVALID_VALUE, 		label : "invalid_value", 		message : "Variable value is invalid" },
	KindInfo { kind : ErrorKind::STACK_OVERFLOW, 		label : "stack_overflow", 		message : "Stack has reached it's maximum size" },
	KindInfo { kind : ErrorKind::ALLOCATION_ERROR, 		label : "allocation_error", 	message : "Error occuried while allocating memory" },
];



// Tests

#[test]
fn test_kind_bits_are_distinct()
{
	let mut seen = ErrorKind { bits : 0 };

	for info in KIND_TABLE.iter()
	{
		assert!(!seen.intersects(info.kind), "kind {} overlaps an earlier entry", info.label);
		seen |= info.kind;
	}

	assert_eq!(seen.bits(), (1 << KIND_TABLE.len()) - 1);
}

#[test]
fn test_kind_table_is_in_bit_order()
{
	let mut previous = 0;

	for info in KIND_TABLE.iter()
	{
		assert!(info.kind.bits() > previous, "table out of order at {}", info.label);
		previous = info.kind.bits();
	}
}

#[test]
fn test_kind_combination()
{
	let kind = ErrorKind::POINTER_IS_NULL | ErrorKind::NUMBER_IS_NAN;

	assert!(kind.intersects(ErrorKind::POINTER_IS_NULL));
	assert!(kind.intersects(ErrorKind::NUMBER_IS_NAN));
	assert!(!kind.intersects(ErrorKind::CANNOT_OPEN_FILE));
	assert!(!kind.is_empty());

	assert_eq!(format!("{:?}", kind), "number_is_nan+pointer_is_null");
}
