//! Types produced by the shell parser and consumed by the intent matchers.

/// Shell operator separating consecutive segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    /// `&&`: run next only if previous succeeded
    And,
    /// `||`: run next only if previous failed
    Or,
    /// `;`: run next unconditionally
    Semi,
    /// `|`: pipe stdout
    Pipe,
    /// `|&`: pipe stdout+stderr
    PipeErr,
    /// unquoted line break
    Newline,
}

impl Operator {
    /// The operator's shell syntax.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Semi => ";",
            Operator::Pipe => "|",
            Operator::PipeErr => "|&",
            Operator::Newline => "\\n",
        }
    }
}

/// A single command within a compound command line.
///
/// Any `$()`, backtick, or process substitution spans have been replaced
/// with [`SUBST_PLACEHOLDER`](super::SUBST_PLACEHOLDER); their contents are
/// parsed separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellSegment {
    pub command: String,
}

/// A fully decomposed command line.
///
/// For `git add . && git commit -m 'x'` there are two segments and one
/// operator. Substitution bodies are kept aside in `substitutions` so they
/// can be decomposed recursively.
#[derive(Debug, Clone, Default)]
pub struct ParsedPipeline {
    pub segments: Vec<ShellSegment>,
    pub operators: Vec<Operator>,
    pub substitutions: Vec<String>,
}

impl ParsedPipeline {
    /// Short shape description for logs, e.g. `compound command (&&, |; 1 substitution(s))`.
    pub fn describe(&self) -> String {
        let mut desc = Vec::new();
        if !self.operators.is_empty() {
            let mut ops: Vec<&str> = self.operators.iter().map(Operator::as_str).collect();
            ops.sort();
            ops.dedup();
            desc.push(ops.join(", "));
        }
        if !self.substitutions.is_empty() {
            desc.push(format!("{} substitution(s)", self.substitutions.len()));
        }
        match (desc.is_empty(), self.segments.len()) {
            (true, n) if n <= 1 => "simple command".to_string(),
            (true, _) => "compound command".to_string(),
            (false, _) => format!("compound command ({})", desc.join("; ")),
        }
    }
}
