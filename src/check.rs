use crate::*;



pub const SKIP_CHECKS : bool = !config::ENABLE_CHECKS;



/// Validates some code assumption without ever stopping the program: a failed
/// check prints a report to stderr and makes the enclosing function return
/// the given fallback value. Checks can be compiled out entirely (based on
/// config features), so conditions shouldn't produce any side effects.
///
/// The optional fourth argument is a cleanup expression, run after the report
/// and before the early return.
///
/// ```rust
/// use softcheck::*;
///
/// fn parse_count(text : &str) -> i32
/// {
///     let parsed : Result<i32, _> = text.parse();
///
///     CHECK! { parsed.is_ok(), ErrorKind::WRONG_DATA_FORMAT, -1 }
///
///     parsed.unwrap_or(-1)
/// }
/// ```

#[macro_export]
macro_rules! CHECK
{
	{ $f_check:expr, $kind:expr, $f_ret:expr, $f_cleanup:expr } =>
	{
		if $crate::check::SKIP_CHECKS
		{
			// Don't even run the check if checks aren't enabled
		}
		else if ($f_check) == false
		{
			// Check has failed: report, clean up, bail out with the fallback

			$crate::report::report($kind, $crate::call_site!());

			$f_cleanup;

			return $f_ret;
		}
	};
	{ $f_check:expr, $kind:expr, $f_ret:expr } =>
	{
		$crate::CHECK!{ $f_check, $kind, $f_ret, () }
	};
}



// Same shape as CHECK!, for code that carries a call tracker: the failure
//  report ends with the tracked stack

#[macro_export]
macro_rules! CHECK_TRACED
{
	{ $trace:expr, $f_check:expr, $kind:expr, $f_ret:expr } =>
	{
		if $crate::check::SKIP_CHECKS
		{
			// Don't even run the check if checks aren't enabled
		}
		else if ($f_check) == false
		{
			$crate::report::report_traced($kind, $crate::call_site!(), &$trace);

			return $f_ret;
		}
	};
}



// Tests

#[cfg(feature="enable_checks")]
#[test]
fn test_failed_check_returns_fallback()
{
	fn first_byte(bytes : &[u8]) -> i32
	{
		CHECK! { !bytes.is_empty(), ErrorKind::POINTER_IS_NULL, -1 }

		bytes[0] as i32
	}

	assert_eq!(first_byte(&[7, 8]), 7);
	assert_eq!(first_byte(&[]), -1);
}

#[cfg(feature="enable_checks")]
#[test]
fn test_cleanup_runs_only_on_failure()
{
	use std::cell::Cell;

	fn clamped(value : u32, touched : &Cell<bool>) -> u32
	{
		CHECK! { value < 10, ErrorKind::INVALID_VALUE, 0, touched.set(true) }

		value
	}

	let touched = Cell::new(false);

	assert_eq!(clamped(5, &touched), 5);
	assert!(!touched.get());

	assert_eq!(clamped(50, &touched), 0);
	assert!(touched.get());
}

#[cfg(all(feature="enable_checks", feature="stack_tracking"))]
#[test]
fn test_traced_check_reports_and_returns()
{
	fn guarded(trace : &CallTrace, value : i32) -> i32
	{
		let _scope = trace_scope!(trace);

		CHECK_TRACED! { trace, value >= 0, ErrorKind::INVALID_VALUE, -1 }

		value * 2
	}

	let trace = CallTrace::new();

	assert_eq!(guarded(&trace, 3), 6);
	assert_eq!(guarded(&trace, -5), -1);
	assert!(trace.is_empty());
}

#[cfg(all(feature="enable_checks", feature="stack_tracking"))]
#[test]
fn test_nested_failure_unwinds_cleanly()
{
	fn level_three(trace : &CallTrace, input : Option<i32>) -> i32
	{
		let _scope = trace_scope!(trace);

		CHECK_TRACED! { trace, input.is_some(), ErrorKind::POINTER_IS_NULL, -1 }

		input.unwrap_or(-1)
	}

	fn level_two(trace : &CallTrace, input : Option<i32>) -> i32
	{
		let _scope = trace_scope!(trace);

		level_three(trace, input)
	}

	fn level_one(trace : &CallTrace, input : Option<i32>) -> i32
	{
		let _scope = trace_scope!(trace);

		level_two(trace, input)
	}

	let trace = CallTrace::new();

	assert_eq!(level_one(&trace, Some(9)), 9);
	assert!(trace.is_empty());

	assert_eq!(level_one(&trace, None), -1);
	assert!(trace.is_empty());
}

#[cfg(not(feature="enable_checks"))]
#[test]
fn test_disabled_checks_never_evaluate()
{
	use std::cell::Cell;

	fn counted(value : u32, evaluations : &Cell<u32>) -> u32
	{
		CHECK!
		{
			{ evaluations.set(evaluations.get() + 1); value < 10 },
			ErrorKind::INVALID_VALUE,
			0
		}

		value
	}

	let evaluations = Cell::new(0);

	assert!(SKIP_CHECKS);
	assert_eq!(counted(50, &evaluations), 50);
	assert_eq!(evaluations.get(), 0);
}
