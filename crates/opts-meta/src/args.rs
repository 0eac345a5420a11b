//! List and argument splitting helpers
//!
//! Properties carry lists as delimited strings. Library and tool lists use
//! `:`, filesystem paths use the platform path-list delimiter, and compiler
//! options are shell-style argument strings.

/// Delimiter between entries of a path list on this platform.
#[cfg(windows)]
pub const PATH_LIST_DELIMITER: char = ';';
/// Delimiter between entries of a path list on this platform.
#[cfg(not(windows))]
pub const PATH_LIST_DELIMITER: char = ':';

/// Split a colon-delimited list, dropping empty segments.
pub fn split_colon_list(input: &str) -> Vec<String> {
    split_nonempty(input, ':')
}

/// Split a path list on [`PATH_LIST_DELIMITER`], dropping empty segments.
pub fn split_path_list(input: &str) -> Vec<String> {
    split_nonempty(input, PATH_LIST_DELIMITER)
}

fn split_nonempty(input: &str, delimiter: char) -> Vec<String> {
    input
        .split(delimiter)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a command-line style string into arguments.
///
/// Whitespace separates arguments. Single quotes group literally, double
/// quotes group with backslash escapes, and a backslash outside quotes
/// escapes the next character. An unterminated quote runs to the end.
pub fn split_arguments(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_arg = true;
                for q in chars.by_ref() {
                    if q == '\'' {
                        break;
                    }
                    current.push(q);
                }
            }
            '"' => {
                in_arg = true;
                while let Some(q) = chars.next() {
                    match q {
                        '"' => break,
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                current.push(escaped);
                            }
                        }
                        _ => current.push(q),
                    }
                }
            }
            '\\' => {
                in_arg = true;
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            c if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            _ => {
                in_arg = true;
                current.push(c);
            }
        }
    }

    if in_arg {
        args.push(current);
    }
    args
}
