pub mod shell;
pub mod tokenize;
pub mod types;

pub use shell::{SUBST_PLACEHOLDER, parse, segments, strip_heredoc_bodies};
pub use tokenize::{program_name, tokenize};
pub use types::{Operator, ParsedPipeline, ShellSegment};
