#[allow(unused_imports)]
use crate::*;



#[cfg(feature="stack_tracking")]
mod imp
{
	use crate::*;

	use std::cell::RefCell;
	use std::io::Write;

	/// One manually recorded call, captured on scope entry by `trace_scope!`.

	#[derive(Clone, Copy)]
	pub struct StackFrame
	{
		pub file 		: &'static str,
		pub function 	: &'static str,
		pub line 		: u32,
	}

	/// A manually instrumented shadow of the call stack, with a fixed frame
	/// budget. The hosting code owns one per logical thread of control and
	/// passes it down by reference.
	///
	/// NOTE (rs) Frame storage must be shoved into a `RefCell` so `push` and
	/// `pop` can take `&self`; that also pins a tracker to a single thread,
	/// which is the intended usage anyway.

	pub struct CallTrace
	{
		frames 	: RefCell<Vec<StackFrame>>,
		ready 	: bool,
	}

	impl CallTrace
	{
		pub fn new() -> Self
		{
			// All frame storage is reserved up front; a tracker that failed to
			//  reserve stays permanently rejecting

			let mut frames = Vec::new();
			let reserved = frames.try_reserve_exact(config::TRACE_BUFFER_SIZE).is_ok();

			CHECK!
			{
				reserved,
				ErrorKind::ALLOCATION_ERROR,
				Self
				{
					frames 	: RefCell::new(Vec::new()),
					ready 	: false,
				}
			}

			Self
			{
				frames 	: RefCell::new(frames),
				ready 	: reserved,
			}
		}

		/// Records one frame. Rejects (reporting, when checks are on) frames
		/// that are unusable or don't fit the budget, and returns whether the
		/// frame was actually recorded.

		pub fn push(&self, file : &'static str, function : &'static str, line : u32) -> bool
		{
			CHECK! { self.ready, 									ErrorKind::INVALID_VALUE, 	false }
			CHECK! { !file.is_empty(), 								ErrorKind::INVALID_VALUE, 	false }
			CHECK! { !function.is_empty(), 							ErrorKind::INVALID_VALUE, 	false }
			CHECK! { line > 0, 										ErrorKind::INVALID_VALUE, 	false }
			CHECK! { file.len() < config::MAX_NAME_LENGTH, 			ErrorKind::LENGTH_TOO_BIG, 	false }
			CHECK! { function.len() < config::MAX_NAME_LENGTH, 		ErrorKind::LENGTH_TOO_BIG, 	false }
			CHECK! { self.len() < config::TRACE_BUFFER_SIZE, 		ErrorKind::STACK_OVERFLOW, 	false }

			// The frame budget holds even with checks compiled out; the
			//  reserved buffer must never grow

			if !self.ready || self.len() >= config::TRACE_BUFFER_SIZE
			{
				return false;
			}

			self.frames.borrow_mut().push(StackFrame { file, function, line });

			true
		}

		pub fn pop(&self)
		{
			CHECK! { !self.is_empty(), ErrorKind::INVALID_VALUE, () }

			self.frames.borrow_mut().pop();
		}

		pub fn len(&self) -> usize
		{
			self.frames.borrow().len()
		}

		pub fn is_empty(&self) -> bool
		{
			self.len() == 0
		}

		/// Prints the tracked frames to stderr, newest first.

		pub fn render(&self)
		{
			self.write_frames(&mut std::io::stderr().lock());
		}

		pub(crate) fn write_frames(&self, out : &mut dyn Write)
		{
			use colored::*;

			if !self.ready
			{
				return;
			}

			for (depth, frame) in self.frames.borrow().iter().rev().enumerate()
			{
				let _ = writeln!(
					out,
					"{}",
					format!(
						"#{}\tfunction: {:<70} (in file {}:{})",
							depth,
							frame.function,
							frame.file,
							frame.line).bold());
			}
		}
	}
}

#[cfg(not(feature="stack_tracking"))]
mod imp
{
	use std::io::Write;

	/// Disabled-tracking stand-in: same surface, records nothing.

	pub struct CallTrace {}

	impl CallTrace
	{
		pub fn new() -> Self
		{
			Self {}
		}

		pub fn push(&self, _file : &'static str, _function : &'static str, _line : u32) -> bool
		{
			false
		}

		pub fn pop(&self)
		{
		}

		pub fn len(&self) -> usize
		{
			0
		}

		pub fn is_empty(&self) -> bool
		{
			true
		}

		pub fn render(&self)
		{
		}

		pub(crate) fn write_frames(&self, _out : &mut dyn Write)
		{
		}
	}
}

pub use imp::*;



/// Holds one tracked frame for the enclosing scope, popping it again on every
/// exit path. A guard whose own push was rejected pops nothing, so a full
/// tracker can't have a neighboring frame popped out from under it.

pub struct TraceScope<'a>
{
	trace 	: &'a CallTrace,
	pushed 	: bool,
}

impl<'a> TraceScope<'a>
{
	pub fn enter(trace : &'a CallTrace, file : &'static str, function : &'static str, line : u32) -> Self
	{
		let pushed = trace.push(file, function, line);

		Self { trace, pushed }
	}
}

impl Drop for TraceScope<'_>
{
	fn drop(&mut self)
	{
		if self.pushed
		{
			self.trace.pop();
		}
	}
}



// Tracks the enclosing scope: one frame on entry, popped on exit. Bind the
//  result to a local (`let _scope = trace_scope!(trace);`) so it lives to the
//  end of the scope.

#[macro_export]
macro_rules! trace_scope
{
	( $trace:expr ) =>
	{
		$crate::trace::TraceScope::enter(&$trace, file!(), $crate::function_name!(), line!())
	};
}



// Tests

#[cfg(feature="stack_tracking")]
#[test]
fn test_push_and_pop()
{
	let trace = CallTrace::new();

	assert!(trace.is_empty());
	assert!(trace.push("src/alpha.rs", "alpha", 10));
	assert!(trace.push("src/beta.rs", "beta", 20));
	assert_eq!(trace.len(), 2);

	trace.pop();
	assert_eq!(trace.len(), 1);

	trace.pop();
	assert!(trace.is_empty());
}

#[cfg(feature="stack_tracking")]
#[test]
fn test_pop_when_empty_is_a_no_op()
{
	let trace = CallTrace::new();

	trace.pop();

	assert!(trace.is_empty());
}

#[cfg(feature="stack_tracking")]
#[test]
fn test_push_past_capacity_is_rejected()
{
	let trace = CallTrace::new();

	for _ in 0..config::TRACE_BUFFER_SIZE
	{
		assert!(trace.push("src/alpha.rs", "alpha", 10));
	}

	assert!(!trace.push("src/alpha.rs", "alpha", 10));
	assert_eq!(trace.len(), config::TRACE_BUFFER_SIZE);
}

#[cfg(all(feature="enable_checks", feature="stack_tracking"))]
#[test]
fn test_push_rejects_unusable_frames()
{
	let trace = CallTrace::new();

	assert!(!trace.push("", "alpha", 10));
	assert!(!trace.push("src/alpha.rs", "", 10));
	assert!(!trace.push("src/alpha.rs", "alpha", 0));

	let long_name : &'static str = Box::leak("x".repeat(config::MAX_NAME_LENGTH).into_boxed_str());
	assert!(!trace.push("src/alpha.rs", long_name, 10));

	assert!(trace.is_empty());
}

#[cfg(feature="stack_tracking")]
#[test]
fn test_frames_render_newest_first()
{
	colored::control::set_override(false);

	let trace = CallTrace::new();

	assert!(trace.push("src/outer.rs", "outer", 1));
	assert!(trace.push("src/middle.rs", "middle", 2));
	assert!(trace.push("src/inner.rs", "inner", 3));

	let mut sink = Vec::new();
	trace.write_frames(&mut sink);

	let text = String::from_utf8(sink).unwrap();
	let frame_lines : Vec<&str> = text.lines().collect();

	assert_eq!(frame_lines.len(), 3);
	assert!(frame_lines[0].starts_with("#0\tfunction: inner"));
	assert!(frame_lines[0].ends_with("(in file src/inner.rs:3)"));
	assert!(frame_lines[1].starts_with("#1\tfunction: middle"));
	assert!(frame_lines[2].starts_with("#2\tfunction: outer"));
	assert!(frame_lines[2].ends_with("(in file src/outer.rs:1)"));

	trace.render();
}

#[cfg(feature="stack_tracking")]
#[test]
fn test_scope_guard_tracks_nested_calls()
{
	fn inner(trace : &CallTrace) -> usize
	{
		let _scope = trace_scope!(trace);

		trace.len()
	}

	fn outer(trace : &CallTrace) -> usize
	{
		let _scope = trace_scope!(trace);

		inner(trace)
	}

	let trace = CallTrace::new();
	let depth_inside = outer(&trace);

	assert_eq!(depth_inside, 2);
	assert!(trace.is_empty());
}

#[cfg(all(feature="enable_checks", feature="stack_tracking"))]
#[test]
fn test_scope_guard_pops_on_early_return()
{
	fn checked(trace : &CallTrace, value : i32) -> i32
	{
		let _scope = trace_scope!(trace);

		CHECK! { value >= 0, ErrorKind::INVALID_VALUE, -1 }

		value * 2
	}

	let trace = CallTrace::new();

	assert_eq!(checked(&trace, 4), 8);
	assert!(trace.is_empty());

	assert_eq!(checked(&trace, -4), -1);
	assert!(trace.is_empty());
}

#[cfg(feature="stack_tracking")]
#[test]
fn test_five_nested_scopes_render_innermost_first()
{
	colored::control::set_override(false);

	fn level_five(trace : &CallTrace, sink : &mut Vec<u8>)
	{
		let _scope = trace_scope!(trace);

		trace.write_frames(sink);
	}

	fn level_four(trace : &CallTrace, sink : &mut Vec<u8>)
	{
		let _scope = trace_scope!(trace);

		level_five(trace, sink);
	}

	fn level_three(trace : &CallTrace, sink : &mut Vec<u8>)
	{
		let _scope = trace_scope!(trace);

		level_four(trace, sink);
	}

	fn level_two(trace : &CallTrace, sink : &mut Vec<u8>)
	{
		let _scope = trace_scope!(trace);

		level_three(trace, sink);
	}

	fn level_one(trace : &CallTrace, sink : &mut Vec<u8>)
	{
		let _scope = trace_scope!(trace);

		level_two(trace, sink);
	}

	let trace = CallTrace::new();
	let mut sink = Vec::new();

	level_one(&trace, &mut sink);

	let text = String::from_utf8(sink).unwrap();
	let frame_lines : Vec<&str> = text.lines().collect();

	assert_eq!(frame_lines.len(), 5);

	let expected_names = ["level_five", "level_four", "level_three", "level_two", "level_one"];

	for (depth, name) in expected_names.iter().enumerate()
	{
		assert!(frame_lines[depth].starts_with(&format!("#{}\tfunction: ", depth)));
		assert!(frame_lines[depth].contains(name), "depth {} should be {}: {}", depth, name, frame_lines[depth]);
		assert!(frame_lines[depth].contains("(in file src/trace.rs:"));
	}

	assert!(trace.is_empty());
}

#[cfg(feature="stack_tracking")]
#[test]
fn test_scope_guard_skips_pop_for_rejected_push()
{
	let trace = CallTrace::new();

	for _ in 0..config::TRACE_BUFFER_SIZE
	{
		assert!(trace.push("src/alpha.rs", "alpha", 10));
	}

	{
		let _scope = TraceScope::enter(&trace, "src/beta.rs", "beta", 20);
	}

	// The rejected push must not cost an unrelated frame

	assert_eq!(trace.len(), config::TRACE_BUFFER_SIZE);
}

#[cfg(not(feature="stack_tracking"))]
#[test]
fn test_disabled_tracker_records_nothing()
{
	let trace = CallTrace::new();

	assert!(!trace.push("src/alpha.rs", "alpha", 10));
	assert!(trace.is_empty());
	assert_eq!(trace.len(), 0);

	let _scope = trace_scope!(trace);
	assert!(trace.is_empty());
}
