//! Terminal navigator: prints provider links instead of opening a browser
//! tab. Only the URL leaves this process; the session token never does.

use std::io::{self, Write};

use owo_colors::OwoColorize;
use tracing::warn;
use url::Url;

use earnhub_core::Navigator;

pub struct TerminalNavigator {
    color: bool,
}

impl TerminalNavigator {
    pub fn new(color: bool) -> Self {
        Self { color }
    }
}

impl Navigator for TerminalNavigator {
    fn open_external(&self, url: &Url) {
        if let Err(e) = write_link(&mut io::stdout().lock(), url, self.color) {
            warn!(error = %e, %url, "could not print offer link");
        }
    }
}

fn write_link(out: &mut impl Write, url: &Url, color: bool) -> io::Result<()> {
    if color {
        writeln!(out, "{}", url.as_str().underline())
    } else {
        writeln!(out, "{url}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn link() -> Url {
        Url::parse("https://partner.example/go?clickId=clk-1").unwrap()
    }

    #[test]
    fn plain_link_is_one_line() {
        let mut out = Vec::new();
        write_link(&mut out, &link(), false).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "https://partner.example/go?clickId=clk-1\n"
        );
    }

    #[test]
    fn colored_link_keeps_the_url() {
        let mut out = Vec::new();
        write_link(&mut out, &link(), true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("https://partner.example/go?clickId=clk-1"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn write_failure_is_reported_to_the_caller() {
        let err = write_link(&mut ClosedPipe, &link(), false).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
