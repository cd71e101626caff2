//! Dispatch logic: extract params from ArgMatches and convert to command args.
//!
//! `*Params` structs mirror the command `*Args` but are populated from clap;
//! `Into<*Args>` bridges them to the command handlers.

use std::path::PathBuf;

use clap::ArgMatches;

use super::ColorChoice;
use crate::commands::check::CheckArgs;
use crate::commands::fmt::FmtArgs;
use crate::commands::schema::SchemaArgs;
use crate::commands::tree::TreeArgs;

/// Flags every subcommand inherits.
pub struct GlobalParams {
    pub config: Option<PathBuf>,
    pub verbose: u8,
}

impl GlobalParams {
    /// Reads global flags from a subcommand's matches, where clap propagates
    /// them regardless of their position on the command line.
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            config: m.get_one::<PathBuf>("config").cloned(),
            verbose: m.get_count("verbose"),
        }
    }
}

pub struct CheckParams {
    pub document_path: Option<PathBuf>,
    pub document_text: Option<String>,
    pub strict: bool,
    pub compact: bool,
    pub color: ColorChoice,
}

impl CheckParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            document_path: m.get_one::<PathBuf>("document_path").cloned(),
            document_text: m.get_one::<String>("document_text").cloned(),
            strict: m.get_flag("strict"),
            compact: m.get_flag("compact"),
            color: parse_color(m),
        }
    }
}

impl From<CheckParams> for CheckArgs {
    fn from(p: CheckParams) -> Self {
        Self {
            document_path: p.document_path,
            document_text: p.document_text,
            strict: p.strict,
            compact: p.compact,
            color: p.color.should_colorize(),
        }
    }
}

pub struct FmtParams {
    pub document_path: Option<PathBuf>,
    pub document_text: Option<String>,
    pub color: ColorChoice,
}

impl FmtParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            document_path: m.get_one::<PathBuf>("document_path").cloned(),
            document_text: m.get_one::<String>("document_text").cloned(),
            color: parse_color(m),
        }
    }
}

impl From<FmtParams> for FmtArgs {
    fn from(p: FmtParams) -> Self {
        Self {
            document_path: p.document_path,
            document_text: p.document_text,
            color: p.color.should_colorize(),
        }
    }
}

pub struct TreeParams {
    pub document_path: Option<PathBuf>,
    pub document_text: Option<String>,
    pub spans: bool,
    pub color: ColorChoice,
}

impl TreeParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            document_path: m.get_one::<PathBuf>("document_path").cloned(),
            document_text: m.get_one::<String>("document_text").cloned(),
            spans: m.get_flag("spans"),
            color: parse_color(m),
        }
    }
}

impl From<TreeParams> for TreeArgs {
    fn from(p: TreeParams) -> Self {
        Self {
            document_path: p.document_path,
            document_text: p.document_text,
            spans: p.spans,
            color: p.color.should_colorize(),
        }
    }
}

pub struct NewParams;

impl NewParams {
    pub fn from_matches(_m: &ArgMatches) -> Self {
        Self
    }
}

pub struct SchemaParams {
    pub json: bool,
}

impl SchemaParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            json: m.get_flag("json"),
        }
    }
}

impl From<SchemaParams> for SchemaArgs {
    fn from(p: SchemaParams) -> Self {
        Self { json: p.json }
    }
}

fn parse_color(m: &ArgMatches) -> ColorChoice {
    match m.get_one::<String>("color").map(|s| s.as_str()) {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}
