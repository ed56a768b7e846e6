/// Basename of a command word: `/usr/bin/git` → `git`, `./run.sh` → `run.sh`.
pub fn program_name(word: &str) -> &str {
    match word.rsplit_once('/') {
        Some((_, name)) if !name.is_empty() => name,
        _ => word,
    }
}

/// Tokenize a command segment into words using shlex (POSIX word splitting).
pub fn tokenize(command: &str) -> Vec<String> {
    shlex::split(command).unwrap_or_else(|| {
        // Unbalanced quotes: fall back to whitespace splitting
        command.split_whitespace().map(String::from).collect()
    })
}
