use crate::*;

use std::io::Write;



pub(crate) fn warn(out : &mut dyn Write, message : &str)
{
	use colored::*;

	let _ = writeln!(out, "{}", message.yellow().bold());
}

fn write_source_context(out : &mut dyn Write, context : &SourceContext, target_line : u32)
{
	use colored::*;

	let lines = context.lines();

	// The target line carries its number in the gutter; neighbors get a blank
	//  gutter. Empty slots aren't rendered.

	if context.target_slot() == 0
	{
		let _ = writeln!(out, "{}", format!("{:>5}|\t{}", target_line, lines[0]).blue().bold());

		if !lines[1].is_empty()
		{
			let _ = writeln!(out, "{}", format!("     |\t{}", lines[1]).white());
		}
	}
	else
	{
		let _ = writeln!(out, "{}", format!("     |\t{}", lines[0]).white());
		let _ = writeln!(out, "{}", format!("{:>5}|\t{}", target_line, lines[1]).blue().bold());
	}

	if !lines[2].is_empty()
	{
		let _ = writeln!(out, "{}", format!("     |\t{}", lines[2]).white());
	}
}

// All three report sections write to the same sink so warnings raised while
//  re-reading the source land inside the report, not interleaved around it

fn write_report(
	out 	: &mut dyn Write,
	kind 	: ErrorKind,
	site 	: CallSite,
	trace 	: Option<&CallTrace>)
{
	use colored::*;

	let _ = writeln!(out);

	// One line per raised kind, in table order

	for info in kind::KIND_TABLE.iter()
	{
		if kind.intersects(info.kind)
		{
			let _ = writeln!(out, "{}", format!("{}: {}", info.label, info.message).red());
		}
	}

	let _ = writeln!(out, "{}", format!("in {}", site).red());

	if let Some(context) = source::read_source_into(out, site.file, site.line)
	{
		write_source_context(out, &context, site.line);
	}

	let _ = writeln!(out);

	if config::TRACK_CALL_STACK
	{
		if let Some(trace) = trace
		{
			let _ = writeln!(out, "{}", "STACK TRACE:".red().bold());

			trace.write_frames(out);
		}
	}

	let _ = writeln!(out);
}

/// Prints a failure report for `kind` at `site` to stderr: the message for
/// each raised kind, the call site, and the offending source lines when they
/// can still be trusted.

pub fn report(kind : ErrorKind, site : CallSite)
{
	write_report(&mut std::io::stderr().lock(), kind, site, None);
}

/// Same as [`report`], with the tracked call stack rendered after the rest
/// of the report.

pub fn report_traced(kind : ErrorKind, site : CallSite, trace : &CallTrace)
{
	write_report(&mut std::io::stderr().lock(), kind, site, Some(trace));
}



// Tests

#[cfg(test)]
fn plain_report(kind : ErrorKind, site : CallSite, trace : Option<&CallTrace>) -> String
{
	colored::control::set_override(false);

	let mut sink = Vec::new();
	write_report(&mut sink, kind, site, trace);

	String::from_utf8(sink).unwrap()
}

// Report sites hold 'static paths; tests leak a few bytes to make one

#[cfg(test)]
fn leaked_path(path : &std::path::Path) -> &'static str
{
	Box::leak(path.to_str().unwrap().to_owned().into_boxed_str())
}

#[test]
fn test_report_lists_each_raised_kind_once()
{
	let raised = ErrorKind::NUMBER_IS_NAN | ErrorKind::CANNOT_OPEN_FILE | ErrorKind::STACK_OVERFLOW;
	let text = plain_report(raised, CallSite::new("missing/sample.rs", "tester", 10), None);

	for info in kind::KIND_TABLE.iter()
	{
		let line = format!("{}: {}", info.label, info.message);

		let expected = match raised.intersects(info.kind)
		{
			true 	=> 1,
			false 	=> 0,
		};

		assert_eq!(text.matches(&line).count(), expected, "kind {}", info.label);
	}

	assert!(text.starts_with('\n'));
	assert!(text.ends_with("\n\n"));
}

#[test]
fn test_report_kind_order_is_stable()
{
	let raised = ErrorKind::STACK_OVERFLOW | ErrorKind::NUMBER_IS_NAN | ErrorKind::CANNOT_OPEN_FILE;
	let text = plain_report(raised, CallSite::new("missing/sample.rs", "tester", 10), None);

	let nan = text.find("number_is_nan").unwrap();
	let open = text.find("cannot_open_file").unwrap();
	let overflow = text.find("stack_overflow").unwrap();

	assert!(nan < open);
	assert!(open < overflow);
}

#[test]
fn test_report_names_call_site()
{
	let text = plain_report(
		ErrorKind::POINTER_IS_NULL,
		CallSite::new("missing/sample.rs", "sample::run", 42),
		None);

	assert!(text.contains("in sample::run missing/sample.rs:42"), "report was: {}", text);
}

#[test]
fn test_report_shows_source_context()
{
	use std::time::Duration;

	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("sample.rs");

	std::fs::write(&path, "let one = 1;\nlet two = 2;\nlet three = 3;\nlet four = 4;\n").unwrap();

	let file = std::fs::File::options().write(true).open(&path).unwrap();
	let binary_modified = std::fs::metadata(std::env::current_exe().unwrap()).unwrap().modified().unwrap();
	file.set_modified(binary_modified - Duration::from_secs(3600)).unwrap();

	let text = plain_report(
		ErrorKind::INVALID_VALUE,
		CallSite::new(leaked_path(&path), "sample::run", 3),
		None);

	assert!(text.contains("     |\tlet two = 2;"), "report was: {}", text);
	assert!(text.contains("    3|\tlet three = 3;"), "report was: {}", text);
	assert!(text.contains("     |\tlet four = 4;"), "report was: {}", text);
}

#[test]
fn test_report_skips_context_for_newer_source()
{
	use std::time::Duration;

	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("sample.rs");

	std::fs::write(&path, "let one = 1;\nlet two = 2;\nlet three = 3;\n").unwrap();

	let file = std::fs::File::options().write(true).open(&path).unwrap();
	let binary_modified = std::fs::metadata(std::env::current_exe().unwrap()).unwrap().modified().unwrap();
	file.set_modified(binary_modified + Duration::from_secs(3600)).unwrap();

	let text = plain_report(
		ErrorKind::INVALID_VALUE,
		CallSite::new(leaked_path(&path), "sample::run", 2),
		None);

	assert!(text.contains("Source file was modified after the binary was built!"));
	assert!(!text.contains("|\t"), "stale source must not be rendered: {}", text);
}

#[cfg(feature="stack_tracking")]
#[test]
fn test_report_renders_trace_newest_first()
{
	let trace = CallTrace::new();

	assert!(trace.push("src/alpha.rs", "alpha", 10));
	assert!(trace.push("src/beta.rs", "beta", 20));

	let text = plain_report(
		ErrorKind::POINTER_IS_NULL,
		CallSite::new("missing/sample.rs", "beta", 21),
		Some(&trace));

	assert!(text.contains("STACK TRACE:"));
	assert!(text.contains("(in file src/beta.rs:20)"));
	assert!(text.contains("(in file src/alpha.rs:10)"));

	let newest = text.find("#0\tfunction: beta").unwrap();
	let oldest = text.find("#1\tfunction: alpha").unwrap();

	assert!(newest < oldest);
}
