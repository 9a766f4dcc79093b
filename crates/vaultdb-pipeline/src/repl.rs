//! The interactive `vault> ` loop.
use std::io::{self, BufRead, Write};

use crate::render::{format_file_content, format_file_list, format_results, RenderOptions};
use crate::searcher::VaultSearcher;

pub const PROMPT: &str = "vault> ";
pub const EXITING: &str = "Exiting...";
pub const UNKNOWN_COMMAND: &str = "Unknown command. Type 'quit' to exit.";
pub const HELP: &str = "Commands:
  search <query>     - Semantic search
  file <pattern>     - Find files by name pattern
  dir <directory>    - List files in directory
  content <filepath> - Show full content of file
  list               - List all indexed files
  quit               - Exit
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Empty,
    Quit,
    Search(String),
    File(String),
    Dir(String),
    Content(String),
    List,
    Unknown,
}

impl ReplCommand {
    /// Verbs are case-insensitive; arguments are kept as typed, minus
    /// surrounding whitespace. A verb missing its argument is `Unknown`.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        if matches!(line.to_lowercase().as_str(), "quit" | "exit" | "q") {
            return Self::Quit;
        }
        let (verb, arg) = match line.split_once(' ') {
            Some((verb, rest)) => (verb, Some(rest.trim()).filter(|a| !a.is_empty())),
            None => (line, None),
        };
        let arg = arg.map(str::to_string);
        match (verb.to_lowercase().as_str(), arg) {
            ("search", Some(a)) => Self::Search(a),
            ("file", Some(a)) => Self::File(a),
            ("dir", Some(a)) => Self::Dir(a),
            ("content", Some(a)) => Self::Content(a),
            ("list", _) => Self::List,
            _ => Self::Unknown,
        }
    }
}

/// Read commands from `input` until `quit` or end of input. Search results
/// use `opts`; file and directory listings never show content. Lines that
/// are not valid UTF-8 are decoded lossily and end up as unknown commands.
pub fn run<R: BufRead, W: Write>(
    searcher: &VaultSearcher<'_>,
    opts: &RenderOptions,
    mut input: R,
    out: &mut W,
) -> io::Result<()> {
    let settings = searcher.settings().clone();
    let listing = RenderOptions { show_content: false, ..*opts };
    write!(out, "\n🔍 Interactive Search Mode\n{HELP}\n")?;

    let mut buf = Vec::new();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            writeln!(out)?;
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let text = match ReplCommand::parse(&line) {
            ReplCommand::Empty => continue,
            ReplCommand::Quit => break,
            ReplCommand::Search(query) => format_results(&searcher.search(&query, settings.default_limit, None), opts),
            ReplCommand::File(pattern) => {
                format_results(&searcher.search_by_file_pattern(&pattern, settings.pattern_limit), &listing)
            }
            ReplCommand::Dir(directory) => {
                format_results(&searcher.search_by_directory(&directory, "", settings.default_limit), &listing)
            }
            ReplCommand::Content(path) => format_file_content(&path, &searcher.file_content(&path)),
            ReplCommand::List => format_file_list(&searcher.list_files(), settings.list_limit),
            ReplCommand::Unknown => format!("{UNKNOWN_COMMAND}\n"),
        };
        write!(out, "{text}")?;
    }
    Ok(())
}
