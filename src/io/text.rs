use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

pub(super) fn open_text<P: AsRef<Path>>(filepath: P) -> Result<TextParserContext<BufReader<File>>> {
    let filepath = filepath.as_ref();
    let file = File::open(filepath)?;
    Ok(TextParserContext::new(BufReader::new(file), filepath))
}

/// Line reader that remembers where it is for error messages.
pub(super) struct TextParserContext<R> {
    reader: R,
    filepath: String,
    line_count: usize,
}

impl<R: BufRead> TextParserContext<R> {
    pub fn new(reader: R, filepath: &Path) -> Self {
        Self {
            reader,
            filepath: filepath.display().to_string(),
            line_count: 0,
        }
    }

    /// Reads a line and increase the line counter. It already trim the string.
    /// Returns `None` at the end of the file.
    pub fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        self.line_count += 1;
        Ok(Some(line.trim().to_string()))
    }

    /// Like `read_line`, but skips blank lines and `#` comments.
    pub fn read_content_line(&mut self) -> Result<Option<String>> {
        while let Some(line) = self.read_line()? {
            if !line.is_empty() && !line.starts_with('#') {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    /// Same as `read_content_line`, but the end of file is an error.
    pub fn expect_content_line(&mut self, what: &str) -> Result<String> {
        self.read_content_line()?
            .ok_or_else(|| self.gen_error(format!("unexpected end of file, expected {what}")))
    }

    /// Formats an error message by putting the file name, the current line and the supplied message.
    ///
    /// # Arguments
    ///
    /// * `message` - An error message.
    pub fn gen_error<T: AsRef<str>>(&self, message: T) -> Error {
        Error::parser(format!(
            "{}:{}: {}",
            self.filepath,
            self.line_count,
            message.as_ref()
        ))
    }

    pub fn parse<T: FromStr>(&self, token: &str, what: &str) -> Result<T> {
        token
            .parse::<T>()
            .map_err(|_| self.gen_error(format!("invalid {what}, got `{token}`")))
    }
}

/// Whitespace token stream for formats whose records may span lines.
pub(super) struct Tokenizer<R> {
    context: TextParserContext<R>,
    pending: VecDeque<String>,
}

impl<R: BufRead> Tokenizer<R> {
    pub fn new(context: TextParserContext<R>) -> Self {
        Self {
            context,
            pending: VecDeque::new(),
        }
    }

    fn fill(&mut self) -> Result<bool> {
        while self.pending.is_empty() {
            match self.context.read_line()? {
                Some(line) => self
                    .pending
                    .extend(line.split_whitespace().map(str::to_string)),
                None => return Ok(false),
            }
        }
        Ok(true)
    }

    pub fn peek(&mut self) -> Result<Option<&str>> {
        if self.fill()? {
            Ok(self.pending.front().map(String::as_str))
        } else {
            Ok(None)
        }
    }

    pub fn next_token(&mut self) -> Result<Option<String>> {
        if self.fill()? {
            Ok(self.pending.pop_front())
        } else {
            Ok(None)
        }
    }

    pub fn require(&mut self, what: &str) -> Result<String> {
        match self.next_token()? {
            Some(token) => Ok(token),
            None => Err(self
                .context
                .gen_error(format!("unexpected end of file, expected {what}"))),
        }
    }

    pub fn parse_next<T: FromStr>(&mut self, what: &str) -> Result<T> {
        let token = self.require(what)?;
        self.context.parse(&token, what)
    }

    /// Drops the rest of the current line.
    pub fn skip_line(&mut self) {
        self.pending.clear();
    }

    pub fn gen_error<T: AsRef<str>>(&self, message: T) -> Error {
        self.context.gen_error(message)
    }
}
