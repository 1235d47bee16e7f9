


mod cfg
{
	#[cfg(feature="enable_checks")] 		pub const ENABLE_CHECKS 	: bool = true;
	#[cfg(not(feature="enable_checks"))] 	pub const ENABLE_CHECKS 	: bool = false;

	#[cfg(feature="stack_tracking")] 		pub const TRACK_CALL_STACK 	: bool = true;
	#[cfg(not(feature="stack_tracking"))] 	pub const TRACK_CALL_STACK 	: bool = false;
}

pub use cfg::*;



// Fixed storage sizes for trace and report data

pub const TRACE_BUFFER_SIZE : usize = 64;
pub const MAX_LINE_LENGTH 	: usize = 300;
pub const MAX_NAME_LENGTH 	: usize = 4096;
