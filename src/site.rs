#[allow(unused_imports)]
use crate::*;



/// Where a failed check (or a tracked call) lives in the source.

#[derive(Clone, Copy)]
pub struct CallSite
{
	pub file 		: &'static str,
	pub function 	: &'static str,
	pub line 		: u32,
}

impl CallSite
{
	pub const fn new(file : &'static str, function : &'static str, line : u32) -> Self
	{
		Self { file, function, line }
	}
}

impl std::fmt::Display for CallSite
{
	fn fmt(&self, formatter : &mut std::fmt::Formatter) -> std::fmt::Result
	{
		write!(formatter, "{} {}:{}", self.function, self.file, self.line)
	}
}



// NOTE (rs) There's no function counterpart to file!() / line!(), so this
//  names a throwaway local item and trims the suffix off its type path. The
//  local fn is what ties the name to the *enclosing* function.

#[macro_export]
macro_rules! function_name
{
	() =>
	{{
		fn f() {}

		fn type_name_of<T>(_ : T) -> &'static str
		{
			std::any::type_name::<T>()
		}

		let name = type_name_of(f);

		match name.strip_suffix("::f")
		{
			Some(trimmed) 	=> trimmed,
			None 			=> name,
		}
	}};
}



// Captures the spot where it's written; check macros expand this at their
//  own call site

#[macro_export]
macro_rules! call_site
{
	() =>
	{
		$crate::site::CallSite::new(file!(), $crate::function_name!(), line!())
	};
}



// Tests

#[test]
fn test_function_name()
{
	let name = function_name!();

	assert!(name.ends_with("test_function_name"), "unexpected function name: {}", name);
}

#[test]
fn test_call_site_capture()
{
	let site = call_site!();

	assert!(site.file.ends_with("site.rs"));
	assert!(site.function.ends_with("test_call_site_capture"));
	assert!(site.line > 0);
}

#[test]
fn test_call_site_display()
{
	let site = CallSite::new("src/sample.rs", "sample::run", 21);

	assert_eq!(format!("{}", site), "sample::run src/sample.rs:21");
}
