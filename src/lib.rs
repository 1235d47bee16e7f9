

// General library config

pub mod config;

// Error kinds & call sites

pub mod kind;
pub mod site;

// Failure reports

pub mod source;
pub mod report;

// Checks & call tracking

pub mod check;
pub mod trace;



pub use kind::ErrorKind;
pub use site::CallSite;
pub use source::{ SourceContext, read_source };
pub use report::{ report, report_traced };
pub use trace::*;
