//! The line-oriented request loop: a pattern line, then a subject line,
//! until the input runs out.
//!
//! A bad request is reported and skipped; only end of input (or a failure to
//! read or write) ends the loop.
use crate::{parser::parse, render, AnnotatedTree, Automaton, Result};
use rayon::prelude::*;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub pattern: String,
    pub subject: String,
}

impl Request {
    pub fn new(pattern: impl ToString, subject: impl ToString) -> Self {
        Self {
            pattern: pattern.to_string(),
            subject: subject.to_string(),
        }
    }
}

/// Parse both sides of a request and match them.
pub fn process(request: &Request) -> Result<AnnotatedTree> {
    let pattern = parse(&request.pattern)?;
    let subject = parse(&request.subject)?;
    let automaton = Automaton::build(&pattern)?;
    crate::match_tree(&automaton, &subject)
}

/// Process independent requests concurrently. Results come back in the
/// order of `requests`.
pub fn match_batch(requests: &[Request]) -> Vec<Result<AnnotatedTree>> {
    requests.par_iter().map(process).collect()
}

#[derive(Clone, Debug)]
pub struct Options {
    /// Replace brackets with terminal colours
    pub colour: bool,
    /// Write "> " before each rendering
    pub prompt: bool,
    /// Also write every successful match as Graphviz DOT into this directory
    pub dot_dir: Option<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            colour: false,
            prompt: true,
            dot_dir: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub requests: usize,
    /// Requests in which at least one subject node matched
    pub matched: usize,
    pub failed: usize,
}

pub struct Session<R, W> {
    reader: R,
    writer: W,
    options: Options,
    summary: Summary,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(reader: R, writer: W, options: Options) -> Self {
        Self {
            reader,
            writer,
            options,
            summary: Summary::default(),
        }
    }

    /// Read the next pattern/subject pair. `None` means the input is
    /// exhausted, including when a pattern line has no subject after it.
    pub fn next_request(&mut self) -> io::Result<Option<Request>> {
        let Some(pattern) = self.read_line()? else {
            return Ok(None);
        };
        let Some(subject) = self.read_line()? else {
            debug!("Input ended after pattern {:?}", pattern);
            return Ok(None);
        };
        Ok(Some(Request { pattern, subject }))
    }

    /// Read one line without its terminator. Bytes that are not UTF-8 are
    /// replaced with U+FFFD and left for the parser to reject, so only a real
    /// read failure is an `Err`.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = Vec::new();
        if self.reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }

        let line = match String::from_utf8(buf) {
            Ok(line) => line,
            Err(e) => {
                debug!("Input line is not valid UTF-8: {}", e);
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };
        Ok(Some(line))
    }

    /// Handle requests one at a time until the input is exhausted.
    pub fn run(&mut self) -> io::Result<Summary> {
        while let Some(request) = self.next_request()? {
            let result = process(&request);
            self.report(&request, result)?;
        }
        self.finish()
    }

    /// Read every request up front, match them in parallel, then report
    /// them in input order.
    pub fn run_parallel(&mut self) -> io::Result<Summary> {
        let mut requests = Vec::new();
        while let Some(request) = self.next_request()? {
            requests.push(request);
        }
        debug!("Matching {} requests in parallel", requests.len());

        let results = match_batch(&requests);
        for (request, result) in requests.iter().zip(results) {
            self.report(request, result)?;
        }
        self.finish()
    }

    fn report(&mut self, request: &Request, result: Result<AnnotatedTree>) -> io::Result<()> {
        self.summary.requests += 1;
        let number = self.summary.requests;

        match result {
            Ok(annotated) => {
                let matched = annotated.matches.matched_count();
                debug!(
                    "Request {}: {} node(s) of {} matched {}",
                    number, matched, request.subject, request.pattern
                );
                if matched > 0 {
                    self.summary.matched += 1;
                }

                if self.options.prompt {
                    write!(self.writer, "> ")?;
                }
                writeln!(self.writer, "{}", render::render(&annotated, self.options.colour))?;

                if let Some(dir) = &self.options.dot_dir {
                    let path = dir.join(format!("request-{}.dot", number));
                    std::fs::write(&path, render::to_dot(&annotated))?;
                    debug!("Wrote {}", path.display());
                }
            }
            Err(error) => {
                self.summary.failed += 1;
                warn!("Request {} failed: {}", number, error);
                writeln!(self.writer, "error: {}", error)?;
            }
        }

        Ok(())
    }

    fn finish(&mut self) -> io::Result<Summary> {
        self.writer.flush()?;
        info!(
            "Processed {} requests: {} with matches, {} failed",
            self.summary.requests, self.summary.matched, self.summary.failed
        );
        Ok(self.summary)
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::io::Cursor;

    fn run_session(input: &str, options: Options, parallel: bool) -> (String, Summary) {
        let mut session = Session::new(Cursor::new(input.to_string()), Vec::new(), options);
        let summary = if parallel {
            session.run_parallel().unwrap()
        } else {
            session.run().unwrap()
        };
        let output = String::from_utf8(session.into_writer()).unwrap();
        (output, summary)
    }

    fn plain() -> Options {
        Options::default()
    }

    #[test]
    fn test_process_request() {
        let result = process(&Request::new("a(b,c)", "a(b,c)")).unwrap();
        assert_eq!(result.to_string(), "[a(b,c)]");

        assert_eq!(
            process(&Request::new("_", "a")).err(),
            Some(Error::InvalidPattern)
        );
        assert!(matches!(
            process(&Request::new("a", "_")),
            Err(Error::InvalidSubject(_))
        ));
        assert!(matches!(
            process(&Request::new("a(", "a")),
            Err(Error::Syntax { .. })
        ));
    }

    #[test]
    fn test_session_reads_pairs() {
        let input = "a(b,c)\na(b,c)\na(b)\na(a(b))\n";
        let (output, summary) = run_session(input, plain(), false);
        assert_eq!(output, "> [a(b,c)]\n> a([a(b)])\n");
        assert_eq!(
            summary,
            Summary {
                requests: 2,
                matched: 2,
                failed: 0
            }
        );
    }

    #[test]
    fn test_session_recovers_from_bad_requests() {
        let input = "_\na\na(\nb\nf(x,y)\nf(x,y(z))\n";
        let (output, summary) = run_session(input, plain(), false);
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("error: invalid pattern"));
        assert!(lines[1].starts_with("error: syntax error"));
        assert_eq!(lines[2], "> [f(x,y(z))]");
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.requests, 3);
    }

    #[test]
    fn test_unpaired_pattern_ends_the_session() {
        let (output, summary) = run_session("a(_)\r\na(x)\r\nb\n", plain(), false);
        assert_eq!(output, "> [a(x)]\n");
        assert_eq!(summary.requests, 1);

        let (output, summary) = run_session("", plain(), false);
        assert!(output.is_empty());
        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn test_default_options_prompt_without_colour() {
        let options = Options::default();
        assert!(options.prompt);
        assert!(!options.colour);
        assert!(options.dot_dir.is_none());
    }

    #[test]
    fn test_invalid_utf8_line_is_a_request_error() {
        let input = b"a\n\xffa\na(b)\na(b)\n".to_vec();
        let mut session = Session::new(Cursor::new(input), Vec::new(), plain());
        let summary = session.run().unwrap();
        let output = String::from_utf8(session.into_writer()).unwrap();

        let lines: Vec<_> = output.lines().collect();
        assert_eq!(
            lines[0],
            "error: syntax error at offset 0: unexpected character '\u{fffd}'"
        );
        assert_eq!(lines[1], "> [a(b)]");
        assert_eq!(lines.len(), 2);
        assert_eq!(summary.requests, 2);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn test_unmatched_request_still_renders() {
        let options = Options {
            prompt: false,
            ..plain()
        };
        let (output, summary) = run_session("a(b,c)\na(b,d)\n", options, false);
        assert_eq!(output, "a(b,d)\n");
        assert_eq!(summary.matched, 0);
    }

    #[test]
    fn test_parallel_preserves_order() {
        let mut input = String::new();
        let mut expected = String::new();
        for i in 0..50 {
            if i % 3 == 0 {
                input.push_str("a(b)\nc(a(b))\n");
                expected.push_str("> c([a(b)])\n");
            } else if i % 3 == 1 {
                input.push_str("_\nx\n");
                expected.push_str(&format!("error: {}\n", Error::InvalidPattern));
            } else {
                input.push_str("x(_,y)\nx(q,y)\n");
                expected.push_str("> [x(q,y)]\n");
            }
        }

        let (sequential, _) = run_session(&input, plain(), false);
        let (parallel, summary) = run_session(&input, plain(), true);
        assert_eq!(sequential, expected);
        assert_eq!(parallel, expected);
        assert_eq!(summary.requests, 50);
    }

    #[test]
    fn test_match_batch_is_independent_per_request() {
        let requests = vec![
            Request::new("a(_)", "a(x(y))"),
            Request::new("a(b)", "a(c)"),
        ];
        let results = match_batch(&requests);
        assert!(results[0].as_ref().unwrap().root_matched());
        assert!(!results[1].as_ref().unwrap().root_matched());
    }
}
