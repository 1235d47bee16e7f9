use crate::*;

use std::io::{ BufRead, BufReader, Write };
use std::path::PathBuf;
use std::time::SystemTime;



/// Up to three source lines around a reported line. The target normally sits
/// in the middle slot; `shift` moves it to the first slot when there is no
/// line to show above it (top of file, or the line above was blank).

pub struct SourceContext
{
	lines 	: [String; 3],
	shift 	: bool,
}

impl SourceContext
{
	pub fn lines(&self) -> &[String; 3]
	{
		&self.lines
	}

	pub fn target_slot(&self) -> usize
	{
		match self.shift
		{
			true 	=> 0,
			false 	=> 1,
		}
	}
}



fn strip_terminator(bytes : &mut Vec<u8>)
{
	if bytes.last() == Some(&b'\n')
	{
		bytes.pop();
	}

	if bytes.last() == Some(&b'\r')
	{
		bytes.pop();
	}
}

// Context lines are stored in fixed-width report slots; the cap leaves room
//  for the newline and terminator that the on-disk line carries

fn capped_line(bytes : &[u8]) -> String
{
	const CAP : usize = config::MAX_LINE_LENGTH - 2;

	let kept = match bytes.len() > CAP
	{
		true 	=> &bytes[..CAP],
		false 	=> bytes,
	};

	String::from_utf8_lossy(kept).into_owned()
}

// Reads forward to the next line with any content. A line is blank when
//  nothing is left once its terminator is stripped; the returned flag records
//  whether any blank lines were passed over on the way.

fn read_non_blank_line<Reader>(reader : &mut Reader) -> Option<(String, bool)>
	where Reader : BufRead
{
	let mut skipped_blank = false;

	loop
	{
		let mut bytes = Vec::new();

		match reader.read_until(b'\n', &mut bytes)
		{
			Ok(0) 	=> return None,
			Ok(_) 	=> {}
			Err(_) 	=> return None,
		}

		strip_terminator(&mut bytes);

		if bytes.is_empty()
		{
			skipped_blank = true;
			continue;
		}

		return Some((capped_line(&bytes), skipped_blank));
	}
}

pub(crate) fn read_context_lines<Reader>(mut reader : Reader, target_line : u32) -> Option<SourceContext>
	where Reader : BufRead
{
	// Scan to the start of the line above the target. Lines 1 and 2 saturate
	//  to zero skips so the scan never walks past the start of the file.

	let skip_count = target_line.saturating_sub(2);

	for _ in 0..skip_count
	{
		let mut skipped = Vec::new();

		match reader.read_until(b'\n', &mut skipped)
		{
			Ok(0) 	=> return None,
			Ok(_) 	=>
			{
				if skipped.last() != Some(&b'\n')
				{
					// File ended before the target line

					return None;
				}
			}
			Err(_) 	=> return None,
		}
	}

	let mut shift = target_line <= 1;
	let mut lines : [String; 3] = Default::default();

	// When the first read skips blanks it lands on the target itself, not on
	//  the line above it

	let (first, skipped_blank) = read_non_blank_line(&mut reader)?;

	shift = shift || skipped_blank;
	lines[0] = first;

	if let Some((second, _)) = read_non_blank_line(&mut reader)
	{
		lines[1] = second;

		if let Some((third, _)) = read_non_blank_line(&mut reader)
		{
			lines[2] = third;
		}
	}

	let context = SourceContext { lines, shift };

	// Without the target line itself there's nothing worth showing

	if context.lines()[context.target_slot()].is_empty()
	{
		return None;
	}

	Some(context)
}



struct BinaryInfo
{
	path 		: Option<PathBuf>,
	modified 	: Option<SystemTime>,
}

impl BinaryInfo
{
	fn read() -> Self
	{
		let path = std::env::current_exe().ok();

		let modified = match &path
		{
			Some(path) 	=> last_modified(path),
			None 		=> None,
		};

		Self { path, modified }
	}
}

// The running image never changes, so its path and timestamp are resolved
//  once. Source files can change underneath us and get re-checked every call.

lazy_static::lazy_static!
{
	static ref BINARY_INFO : BinaryInfo = BinaryInfo::read();
}

fn last_modified(path : impl AsRef<std::path::Path>) -> Option<SystemTime>
{
	let metadata = std::fs::metadata(path).ok()?;

	metadata.modified().ok()
}

// Context read from a file newer than the running binary would show lines the
//  binary wasn't built from. Each failed step warns and withholds trust.

pub(crate) fn should_trust_source(out : &mut dyn Write, source_path : &str) -> bool
{
	let binary = &*BINARY_INFO;

	let binary_path = match &binary.path
	{
		Some(path) 	=> path,
		None 		=>
		{
			report::warn(out, "Failed to resolve the path of the running binary!");
			return false;
		}
	};

	let mut trusted = true;

	if binary.modified.is_none()
	{
		report::warn(out, &format!("Failed to read binary file metadata! ({})", binary_path.display()));
		trusted = false;
	}

	let source_modified = last_modified(source_path);

	if source_modified.is_none()
	{
		report::warn(out, &format!("Failed to read source file metadata! ({})", source_path));
		trusted = false;
	}

	if let (Some(binary_time), Some(source_time)) = (binary.modified, source_modified)
	{
		if source_time > binary_time
		{
			report::warn(out, "Source file was modified after the binary was built!");
			trusted = false;
		}
	}

	trusted
}

pub(crate) fn read_source_into(
	out 		: &mut dyn Write,
	path 		: &str,
	target_line : u32) -> Option<SourceContext>
{
	if !should_trust_source(out, path)
	{
		return None;
	}

	// The file can legitimately be gone by now (moved, deleted, permissions):
	//  missing context is not an error

	let file = match std::fs::File::open(path)
	{
		Ok(file) 	=> file,
		Err(_) 		=> return None,
	};

	let context = read_context_lines(BufReader::new(file), target_line);

	// The scan ran into the end of the file before the target slot could be
	//  filled. Context reading never raises reports of its own, only warnings.

	if context.is_none()
	{
		report::warn(out, &format!("EOF symbol has been found in input buffer ({})", path));
	}

	context
}

/// Re-reads the source around `target_line` of `path`: the target plus up to
/// one non-blank neighbor on each side. Relative paths resolve against the
/// working directory, since that's what `file!()` captures.
///
/// Returns `None` (after a stderr warning) whenever the source can't be
/// trusted: the file is missing, unreadable, too short, or newer than the
/// running binary.

pub fn read_source(path : &str, target_line : u32) -> Option<SourceContext>
{
	read_source_into(&mut std::io::stderr().lock(), path, target_line)
}



// Tests

#[cfg(test)]
const SAMPLE_SOURCE : &str = "\
let one = 1;
let two = 2;
let three = 3;
let four = 4;
let five = 5;
";

#[cfg(test)]
fn test_binary_modified() -> SystemTime
{
	last_modified(std::env::current_exe().unwrap()).unwrap()
}

#[cfg(test)]
fn set_file_modified(path : &std::path::Path, time : SystemTime)
{
	let file = std::fs::File::options().write(true).open(path).unwrap();
	file.set_modified(time).unwrap();
}

#[test]
fn test_context_middle_line()
{
	use pretty_assertions::assert_eq;

	let reader = std::io::Cursor::new(SAMPLE_SOURCE.as_bytes());
	let context = read_context_lines(reader, 3).unwrap();

	assert_eq!(context.lines()[0], "let two = 2;");
	assert_eq!(context.lines()[1], "let three = 3;");
	assert_eq!(context.lines()[2], "let four = 4;");
	assert_eq!(context.target_slot(), 1);
}

#[test]
fn test_context_first_line()
{
	use pretty_assertions::assert_eq;

	let reader = std::io::Cursor::new(SAMPLE_SOURCE.as_bytes());
	let context = read_context_lines(reader, 1).unwrap();

	assert_eq!(context.lines()[0], "let one = 1;");
	assert_eq!(context.lines()[1], "let two = 2;");
	assert_eq!(context.lines()[2], "let three = 3;");
	assert_eq!(context.target_slot(), 0);
}

#[test]
fn test_context_second_line()
{
	let reader = std::io::Cursor::new(SAMPLE_SOURCE.as_bytes());
	let context = read_context_lines(reader, 2).unwrap();

	assert_eq!(context.lines()[0], "let one = 1;");
	assert_eq!(context.lines()[1], "let two = 2;");
	assert_eq!(context.target_slot(), 1);
}

#[test]
fn test_context_blank_line_above()
{
	let source = "let one = 1;\n\nlet three = 3;\nlet four = 4;\n";

	let reader = std::io::Cursor::new(source.as_bytes());
	let context = read_context_lines(reader, 3).unwrap();

	// The blank line 2 is skipped, so the target lands in the first slot

	assert_eq!(context.target_slot(), 0);
	assert_eq!(context.lines()[0], "let three = 3;");
	assert_eq!(context.lines()[1], "let four = 4;");
	assert_eq!(context.lines()[2], "");
}

#[test]
fn test_context_blank_line_below()
{
	let source = "let one = 1;\nlet two = 2;\nlet three = 3;\n\nlet five = 5;\n";

	let reader = std::io::Cursor::new(source.as_bytes());
	let context = read_context_lines(reader, 3).unwrap();

	assert_eq!(context.target_slot(), 1);
	assert_eq!(context.lines()[1], "let three = 3;");
	assert_eq!(context.lines()[2], "let five = 5;");
}

#[test]
fn test_context_at_end_of_file()
{
	let reader = std::io::Cursor::new(SAMPLE_SOURCE.as_bytes());
	let context = read_context_lines(reader, 5).unwrap();

	assert_eq!(context.target_slot(), 1);
	assert_eq!(context.lines()[0], "let four = 4;");
	assert_eq!(context.lines()[1], "let five = 5;");
	assert_eq!(context.lines()[2], "");
}

#[test]
fn test_context_past_end_of_file()
{
	let reader = std::io::Cursor::new(SAMPLE_SOURCE.as_bytes());

	assert!(read_context_lines(reader, 9).is_none());
}

#[test]
fn test_context_all_blank()
{
	let reader = std::io::Cursor::new("\n\n\n".as_bytes());

	assert!(read_context_lines(reader, 2).is_none());
}

#[test]
fn test_context_long_line_is_capped()
{
	let long_line = "x".repeat(2 * config::MAX_LINE_LENGTH);
	let source = format!("let first = 1;\n{}\nlet third = 3;\n", long_line);

	let reader = std::io::Cursor::new(source.as_bytes());
	let context = read_context_lines(reader, 2).unwrap();

	assert_eq!(context.lines()[0], "let first = 1;");
	assert_eq!(context.lines()[1].len(), config::MAX_LINE_LENGTH - 2);
	assert!(context.lines()[1].bytes().all(|byte| byte == b'x'));

	// The capped line is still consumed in full

	assert_eq!(context.lines()[2], "let third = 3;");
}

#[test]
fn test_context_crlf_terminators()
{
	let source = "let one = 1;\r\nlet two = 2;\r\nlet three = 3;\r\n";

	let reader = std::io::Cursor::new(source.as_bytes());
	let context = read_context_lines(reader, 2).unwrap();

	assert_eq!(context.lines()[0], "let one = 1;");
	assert_eq!(context.lines()[1], "let two = 2;");
}

#[test]
fn test_trust_older_source()
{
	use std::time::Duration;

	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("sample.rs");

	std::fs::write(&path, SAMPLE_SOURCE).unwrap();
	set_file_modified(&path, test_binary_modified() - Duration::from_secs(3600));

	let mut sink = Vec::new();

	assert!(should_trust_source(&mut sink, path.to_str().unwrap()));
	assert!(sink.is_empty(), "no warnings expected for a fresh binary");
}

#[test]
fn test_trust_source_with_equal_timestamp()
{
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("sample.rs");

	std::fs::write(&path, SAMPLE_SOURCE).unwrap();
	set_file_modified(&path, test_binary_modified());

	let mut sink = Vec::new();

	assert!(should_trust_source(&mut sink, path.to_str().unwrap()));
}

#[test]
fn test_distrust_newer_source()
{
	use std::time::Duration;

	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("sample.rs");

	std::fs::write(&path, SAMPLE_SOURCE).unwrap();
	set_file_modified(&path, test_binary_modified() + Duration::from_secs(3600));

	let mut sink = Vec::new();

	assert!(!should_trust_source(&mut sink, path.to_str().unwrap()));

	let warnings = String::from_utf8(sink).unwrap();
	assert!(warnings.contains("modified after the binary"), "unexpected warnings: {}", warnings);
}

#[test]
fn test_distrust_missing_source()
{
	let mut sink = Vec::new();

	assert!(!should_trust_source(&mut sink, "no/such/file.rs"));

	let warnings = String::from_utf8(sink).unwrap();
	assert!(warnings.contains("Failed to read source file metadata!"));
	assert!(warnings.contains("no/such/file.rs"));
}

#[test]
fn test_read_source_from_disk()
{
	use std::time::Duration;

	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("sample.rs");

	std::fs::write(&path, SAMPLE_SOURCE).unwrap();
	set_file_modified(&path, test_binary_modified() - Duration::from_secs(3600));

	let mut sink = Vec::new();
	let context = read_source_into(&mut sink, path.to_str().unwrap(), 4).unwrap();

	assert_eq!(context.lines()[0], "let three = 3;");
	assert_eq!(context.lines()[1], "let four = 4;");
	assert_eq!(context.lines()[2], "let five = 5;");
	assert!(sink.is_empty());
}

#[test]
fn test_read_source_line_out_of_range()
{
	use std::time::Duration;

	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("sample.rs");

	std::fs::write(&path, SAMPLE_SOURCE).unwrap();
	set_file_modified(&path, test_binary_modified() - Duration::from_secs(3600));

	let mut sink = Vec::new();

	assert!(read_source_into(&mut sink, path.to_str().unwrap(), 40).is_none());

	let warnings = String::from_utf8(sink).unwrap();
	assert!(warnings.contains("EOF symbol has been found in input buffer"));
}

#[test]
fn test_read_source_missing_file()
{
	assert!(read_source("no/such/file.rs", 3).is_none());
}
